use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::model::{camel_key, Reference};
use crate::store::ServiceError;

/// Summary of a collection-valued field: where the members live and how many there are
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionSummary {
    #[serde(rename = "ref")]
    pub reference: Reference,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A primitive, or the nested reference of an object-valued field
    Fact(Value),
    Collection(CollectionSummary),
}

/// Fields shaped from one remote item, keyed by camel-cased field name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemRecord {
    /// Set for members of a fetched collection
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl ItemRecord {
    /// Shape raw service fields into a record holding exactly one key per requested name
    pub fn shape(
        raw: &Map<String, Value>,
        facts: &[&str],
        collections: &[&str],
    ) -> Result<Self, ServiceError> {
        let mut fields = BTreeMap::new();

        for fact in facts {
            let value = match raw.get(*fact) {
                Some(Value::Object(nested)) => nested.get("_ref").cloned().unwrap_or(Value::Null),
                Some(value) => value.clone(),
                None => Value::Null,
            };
            fields.insert(camel_key(fact), FieldValue::Fact(value));
        }

        for collection in collections {
            let nested = raw
                .get(*collection)
                .and_then(Value::as_object)
                .ok_or_else(|| {
                    ServiceError::Malformed(format!("collection field {collection} is not an object"))
                })?;
            let reference = nested
                .get("_ref")
                .and_then(Value::as_str)
                .map(Reference::new)
                .unwrap_or_default();
            let count = nested.get("Count").and_then(Value::as_u64).unwrap_or(0);
            fields.insert(
                camel_key(collection),
                FieldValue::Collection(CollectionSummary { reference, count }),
            );
        }

        Ok(Self {
            reference: None,
            fields,
        })
    }

    /// Shape one collection member, keeping its own `_ref`
    pub fn shape_member(
        raw: &Value,
        facts: &[&str],
        collections: &[&str],
    ) -> Result<Self, ServiceError> {
        let member = raw
            .as_object()
            .ok_or_else(|| ServiceError::Malformed("collection member is not an object".to_string()))?;
        let mut record = Self::shape(member, facts, collections)?;
        record.reference = Some(
            member
                .get("_ref")
                .and_then(Value::as_str)
                .map(Reference::new)
                .unwrap_or_default(),
        );
        Ok(record)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn fact(&self, key: &str) -> Option<&Value> {
        match self.fields.get(key)? {
            FieldValue::Fact(value) => Some(value),
            FieldValue::Collection(_) => None,
        }
    }

    /// A fact read as a reference; null, empty and non-string values count as absent
    pub fn fact_reference(&self, key: &str) -> Option<Reference> {
        self.fact(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(Reference::new)
    }

    pub fn collection(&self, key: &str) -> Option<&CollectionSummary> {
        match self.fields.get(key)? {
            FieldValue::Collection(summary) => Some(summary),
            FieldValue::Fact(_) => None,
        }
    }
}

/// A test case as seen by the propagation walk
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub reference: Reference,
    /// The parent user story, if the test case belongs to one
    pub work_product: Option<Reference>,
}

impl TestCase {
    pub fn new(reference: impl Into<Reference>, work_product: Option<Reference>) -> Self {
        Self {
            reference: reference.into(),
            work_product,
        }
    }
}

impl From<&ItemRecord> for TestCase {
    fn from(record: &ItemRecord) -> Self {
        Self {
            reference: record.reference.clone().unwrap_or_default(),
            work_product: record.fact_reference("workProduct"),
        }
    }
}

/// Outcome of a shaping fetch. `Empty` (nothing was asked for) and `Failed`
/// (the service call went wrong) are never the same thing.
#[derive(Debug)]
pub enum Fetch<T> {
    Empty,
    Fetched(T),
    Failed(ServiceError),
}

impl<T> Fetch<T> {
    pub fn is_failed(&self) -> bool {
        matches!(self, Fetch::Failed(_))
    }

    pub fn fetched(self) -> Option<T> {
        match self {
            Fetch::Fetched(value) => Some(value),
            Fetch::Empty | Fetch::Failed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_shape_facts_and_collections() {
        let raw = object(json!({
            "Name": "Login works",
            "PlanEstimate": 3,
            "Ready": true,
            "WorkProduct": {"_ref": "/hierarchicalrequirement/7", "_refObjectName": "Login"},
            "TestCases": {"_ref": "/testfolder/1/TestCases", "Count": 12},
            "Ignored": "not requested"
        }));

        let record = ItemRecord::shape(
            &raw,
            &["Name", "PlanEstimate", "Ready", "WorkProduct"],
            &["TestCases"],
        )
        .unwrap();

        assert_eq!(record.fields.len(), 5);
        assert_eq!(record.fact("name"), Some(&json!("Login works")));
        assert_eq!(record.fact("planEstimate"), Some(&json!(3)));
        assert_eq!(record.fact("ready"), Some(&json!(true)));
        assert_eq!(record.fact("workProduct"), Some(&json!("/hierarchicalrequirement/7")));
        assert_eq!(
            record.collection("testCases"),
            Some(&CollectionSummary {
                reference: Reference::new("/testfolder/1/TestCases"),
                count: 12,
            })
        );
        assert!(record.get("ignored").is_none());
        assert!(record.reference.is_none());
    }

    #[test]
    fn test_null_fact_stays_null() {
        let raw = object(json!({"WorkProduct": null}));
        let record = ItemRecord::shape(&raw, &["WorkProduct", "Description"], &[]).unwrap();
        assert_eq!(record.fact("workProduct"), Some(&Value::Null));
        assert_eq!(record.fact("description"), Some(&Value::Null));
        assert_eq!(record.fact_reference("workProduct"), None);
    }

    #[test]
    fn test_non_object_collection_is_malformed() {
        let raw = object(json!({"TestCases": null}));
        let err = ItemRecord::shape(&raw, &[], &["TestCases"]).unwrap_err();
        assert!(matches!(err, ServiceError::Malformed(_)));
    }

    #[test]
    fn test_member_becomes_test_case() {
        let raw = json!({"_ref": "/tc/1", "WorkProduct": {"_ref": "/story/1"}});
        let record = ItemRecord::shape_member(&raw, &["WorkProduct"], &[]).unwrap();
        let test_case = TestCase::from(&record);
        assert_eq!(test_case.reference, Reference::new("/tc/1"));
        assert_eq!(test_case.work_product, Some(Reference::new("/story/1")));

        let orphan = json!({"_ref": "/tc/2", "WorkProduct": null});
        let record = ItemRecord::shape_member(&orphan, &["WorkProduct"], &[]).unwrap();
        assert_eq!(TestCase::from(&record).work_product, None);
    }

    #[test]
    fn test_record_serializes_with_camel_keys() {
        let raw = object(json!({
            "WorkProduct": {"_ref": "/story/1"},
            "TestCases": {"_ref": "/tf/1/TestCases", "Count": 2}
        }));
        let mut record = ItemRecord::shape(&raw, &["WorkProduct"], &["TestCases"]).unwrap();
        record.reference = Some(Reference::new("/tc/1"));

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "ref": "/tc/1",
                "workProduct": "/story/1",
                "testCases": {"ref": "/tf/1/TestCases", "count": 2}
            })
        );
    }
}
