mod goal;
mod helpers;
mod insights;
mod journal;
mod metrics;
mod quota;
mod shopping;

pub(crate) use goal::{cmd_goal_add, cmd_goal_done, cmd_goal_list, cmd_goal_progress};
pub(crate) use insights::{cmd_forecast, cmd_insights};
pub(crate) use journal::{cmd_journal_add, cmd_journal_delete, cmd_journal_list};
pub(crate) use metrics::{cmd_checkin, cmd_metrics_log, cmd_metrics_show, cmd_water};
pub(crate) use quota::{cmd_quota_plan, cmd_quota_show};
pub(crate) use shopping::{
    cmd_shopping_add, cmd_shopping_remove, cmd_shopping_show, cmd_shopping_toggle,
};
