//! Nodal displacement states.
//!
//! Accepted shapes:
//!
//! ```text
//! {"1": [ux, uy, uz, ...], "2": [...]}          single case
//! {"cases": [{"1": [...]}, {"1": [...]}]}       several cases (modes, steps)
//! ```

use serde_json::Value;
use std::collections::BTreeMap;

use super::ModelError;

/// Displacement vector per node tag
pub type NodeDisplacements = BTreeMap<u64, Vec<f64>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Displacements {
    cases: Vec<NodeDisplacements>,
}

impl Displacements {
    pub fn from_value(value: &Value) -> Result<Self, ModelError> {
        match value.get("cases") {
            Some(Value::Array(cases)) => {
                let cases = cases
                    .iter()
                    .map(parse_case)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self { cases })
            }
            Some(other) => Err(ModelError::InvalidModel(format!(
                "state 'cases' must be an array, got {}",
                other
            ))),
            None => Ok(Self {
                cases: vec![parse_case(value)?],
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Case selected by 1-based `mode`, or the first case.
    pub fn case(&self, mode: Option<u64>) -> Result<&NodeDisplacements, ModelError> {
        let index = mode.map(|m| m.saturating_sub(1) as usize).unwrap_or(0);
        self.cases.get(index).ok_or_else(|| {
            ModelError::InvalidModel(format!(
                "state has {} case(s), mode {} not available",
                self.cases.len(),
                mode.unwrap_or(1)
            ))
        })
    }

    /// Append the cases of `other`.
    pub fn extend(&mut self, other: Displacements) {
        self.cases.extend(other.cases);
    }
}

fn parse_case(value: &Value) -> Result<NodeDisplacements, ModelError> {
    let table = value.as_object().ok_or_else(|| {
        ModelError::InvalidModel("displacement case must be an object".to_string())
    })?;

    let mut case = NodeDisplacements::new();
    for (tag, vector) in table {
        let tag: u64 = tag
            .parse()
            .map_err(|_| ModelError::InvalidModel(format!("invalid node tag '{}'", tag)))?;
        let vector = vector
            .as_array()
            .and_then(|items| items.iter().map(Value::as_f64).collect::<Option<Vec<_>>>())
            .ok_or_else(|| {
                ModelError::InvalidModel(format!("node {}: displacement must be numeric", tag))
            })?;
        case.insert(tag, vector);
    }
    Ok(case)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_case() {
        let raw = json!({"1": [0.0, 0.1, 0.0], "2": [0.2, 0.0, 0.0]});
        let state = Displacements::from_value(&raw).unwrap();
        assert_eq!(state.len(), 1);
        assert_eq!(state.case(None).unwrap()[&2], vec![0.2, 0.0, 0.0]);
    }

    #[test]
    fn test_mode_selection() {
        let state = Displacements::from_value(&json!({
            "cases": [{"1": [1.0]}, {"1": [2.0]}]
        }))
        .unwrap();
        assert_eq!(state.case(Some(2)).unwrap()[&1], vec![2.0]);
        assert_eq!(state.case(Some(1)).unwrap()[&1], vec![1.0]);
        assert!(state.case(Some(3)).unwrap_err().to_string().contains("mode 3"));
    }

    #[test]
    fn test_invalid_states() {
        assert!(Displacements::from_value(&json!({"cases": 4})).is_err());
        assert!(Displacements::from_value(&json!({"x": [1.0]})).is_err());
        assert!(Displacements::from_value(&json!({"1": ["a"]})).is_err());
        assert!(Displacements::from_value(&json!([1.0])).is_err());
    }

    #[test]
    fn test_extend() {
        let mut state = Displacements::from_value(&json!({"1": [1.0]})).unwrap();
        state.extend(Displacements::from_value(&json!({"1": [2.0]})).unwrap());
        assert_eq!(state.len(), 2);
    }
}
