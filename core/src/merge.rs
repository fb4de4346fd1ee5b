use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Items that can be merged by a stable natural key.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for crate::models::ShoppingItem {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Field-level merge policy. Fields listed in `local_wins` keep the current
/// list's value whenever the current item carries the field, regardless of
/// what the incoming copy says.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergePolicy {
    pub local_wins: &'static [&'static str],
}

/// Result of merging an incoming list into the current one.
#[derive(Debug, Clone)]
pub struct MergeOutcome<T> {
    /// Whether the merged list differs from the current one. Callers skip
    /// persistence and remote writes when this is false.
    pub changed: bool,
    pub list: Vec<T>,
}

/// Merge `incoming` into `current` by natural key.
///
/// Items present in both lists take the incoming copy's fields except for
/// the policy's `local_wins` fields, which keep the current value. Items
/// only in `current` are retained unchanged, items only in `incoming` are
/// appended. Order is the current list first (in current order), then new
/// incoming items (in incoming order). Every identifier from either side
/// appears exactly once.
pub fn merge_keyed<T>(
    current: &[T],
    incoming: &[T],
    policy: MergePolicy,
) -> anyhow::Result<MergeOutcome<T>>
where
    T: Keyed + Serialize + DeserializeOwned,
{
    let mut incoming_maps: Vec<(String, Map<String, Value>)> = Vec::with_capacity(incoming.len());
    for item in incoming {
        incoming_maps.push((item.key().to_string(), to_object(item)?));
    }

    let mut merged: Vec<Map<String, Value>> = Vec::new();
    let mut consumed = vec![false; incoming_maps.len()];

    for item in current {
        let local = to_object(item)?;
        let matched = incoming_maps
            .iter()
            .enumerate()
            .position(|(i, (key, _))| key == item.key() && !consumed[i]);
        match matched {
            Some(position) => {
                consumed[position] = true;
                let mut combined = incoming_maps[position].1.clone();
                for field in policy.local_wins {
                    if let Some(value) = local.get(*field) {
                        combined.insert((*field).to_string(), value.clone());
                    }
                }
                merged.push(combined);
            }
            // No incoming counterpart: keep the local copy, never drop it.
            None => merged.push(local),
        }
    }

    for (position, (_, map)) in incoming_maps.iter().enumerate() {
        if !consumed[position] {
            merged.push(map.clone());
        }
    }

    let list: Vec<T> = merged
        .into_iter()
        .map(|map| serde_json::from_value(Value::Object(map)))
        .collect::<Result<_, _>>()?;

    let changed = serde_json::to_string(current)? != serde_json::to_string(&list)?;
    Ok(MergeOutcome { changed, list })
}

fn to_object<T: Serialize>(item: &T) -> anyhow::Result<Map<String, Value>> {
    match serde_json::to_value(item)? {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("expected a JSON object, got {other}"),
    }
}
