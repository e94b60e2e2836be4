use kestrel_labels::{FieldSelector, Selector};
use kestrel_types::{Resource, FIELD_NAME};

/// Label and field selectors narrowing a list or watch.
///
/// Both halves must hold. An empty selector matches everything, so the
/// default predicate selects every object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Predicate {
    pub label: Selector,
    pub field: FieldSelector,
}

impl Predicate {
    pub fn new(label: Selector, field: FieldSelector) -> Self {
        Self { label, field }
    }

    pub fn everything() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, label: Selector) -> Self {
        self.label = label;
        self
    }

    pub fn with_field(mut self, field: FieldSelector) -> Self {
        self.field = field;
        self
    }

    pub fn is_everything(&self) -> bool {
        self.label.is_empty() && self.field.is_empty()
    }

    /// Evaluate against an object's labels and selectable fields.
    pub fn matches<T: Resource>(&self, obj: &T) -> bool {
        if !self.label.is_empty() && !self.label.matches(&obj.meta().labels) {
            return false;
        }
        self.field.is_empty() || self.field.matches(&obj.selectable_fields())
    }

    /// The object name this predicate pins, if any.
    pub fn matches_single_name(&self) -> Option<&str> {
        self.field.matches_single(FIELD_NAME)
    }
}
