use super::{next_version, Operation, OperationKind};
use crate::error::{ModelError, Result};
use crate::model::document::Document;
use crate::model::range::Range;
use crate::model::walker::{TreeWalker, TreeWalkerOptions};
use serde::{Deserialize, Serialize};

/// Change an attribute on every item of a flat range
///
/// `old_value: None` adds the attribute, `new_value: None` removes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeOperation {
    pub range: Range,
    pub key: String,
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub base_version: Option<u64>,
}

impl AttributeOperation {
    pub fn new(
        range: Range,
        key: impl Into<String>,
        old_value: Option<serde_json::Value>,
        new_value: Option<serde_json::Value>,
        base_version: Option<u64>,
    ) -> Self {
        Self {
            range,
            key: key.into(),
            old_value,
            new_value,
            base_version,
        }
    }

    /// Same change with the values swapped.
    pub fn reversed(&self) -> Operation {
        Operation::Attribute(AttributeOperation::new(
            self.range.clone(),
            self.key.clone(),
            self.new_value.clone(),
            self.old_value.clone(),
            next_version(self.base_version),
        ))
    }

    pub(crate) fn validate(&self, doc: &Document) -> Result<()> {
        let invalid = |reason| ModelError::invalid(OperationKind::Attribute, reason);

        if !self.range.is_flat() {
            return Err(invalid("range is not flat"));
        }

        let options = TreeWalkerOptions::builder()
            .boundaries(self.range.clone())
            .shallow(true)
            .build()?;

        for value in TreeWalker::new(doc, options).map_err(|_| invalid("range is invalid"))? {
            let current = doc.node(value?.item.node())?.attribute(&self.key);

            match (&self.old_value, &self.new_value) {
                (Some(old), _) if current != Some(old) => return Err(invalid("wrong old value")),
                (None, Some(_)) if current.is_some() => return Err(invalid("attribute already exists")),
                _ => {}
            }
        }

        Ok(())
    }

    pub(crate) fn execute(&self, doc: &mut Document) -> Result<()> {
        if self.old_value == self.new_value {
            return Ok(());
        }
        doc.set_attribute_in(&self.range, &self.key, self.new_value.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeId, NodeSpec, Position};
    use serde_json::json;

    fn sample() -> (Document, NodeId) {
        let mut doc = Document::new();
        let root = doc.create_root("main").unwrap();
        doc.append_spec(
            root,
            &NodeSpec::element(
                "paragraph",
                vec![
                    NodeSpec::text("ab"),
                    NodeSpec::text("cd").with_attribute("bold", json!(true)),
                ],
            ),
        )
        .unwrap();
        (doc, root)
    }

    fn range(root: NodeId, start: &[usize], end: &[usize]) -> Range {
        Range::new(
            Position::new(root, start.to_vec()).unwrap(),
            Position::new(root, end.to_vec()).unwrap(),
        )
    }

    #[test]
    fn test_set_attribute_splits_and_merges_text() {
        let (mut doc, root) = sample();
        let op = AttributeOperation::new(range(root, &[0, 1], &[0, 2]), "bold", None, Some(json!(true)), Some(0));

        doc.apply_operation(op.into()).unwrap();
        assert_eq!(
            doc.stringify(root).unwrap(),
            "<paragraph>a<$text bold=true>bcd</$text></paragraph>"
        );
    }

    #[test]
    fn test_validation() {
        let (doc, root) = sample();

        let not_flat = AttributeOperation::new(range(root, &[0, 1], &[1]), "bold", None, Some(json!(true)), Some(0));
        assert_eq!(
            not_flat.validate(&doc),
            Err(ModelError::invalid(OperationKind::Attribute, "range is not flat"))
        );

        let exists = AttributeOperation::new(range(root, &[0, 1], &[0, 3]), "bold", None, Some(json!(true)), Some(0));
        assert_eq!(
            exists.validate(&doc),
            Err(ModelError::invalid(OperationKind::Attribute, "attribute already exists"))
        );

        let wrong_old = AttributeOperation::new(
            range(root, &[0, 0], &[0, 3]),
            "bold",
            Some(json!(true)),
            None,
            Some(0),
        );
        assert_eq!(
            wrong_old.validate(&doc),
            Err(ModelError::invalid(OperationKind::Attribute, "wrong old value"))
        );

        let fine = AttributeOperation::new(range(root, &[0, 2], &[0, 4]), "bold", Some(json!(true)), None, Some(0));
        assert_eq!(fine.validate(&doc), Ok(()));
    }
}
