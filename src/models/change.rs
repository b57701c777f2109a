use serde::Serialize;

/// 变更类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    New,
    Removed,
    Modified,
}

/// 变更中的一个展示字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeField {
    pub name: String,
    pub value: String,
    pub emphasized: bool,
}

impl ChangeField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            emphasized: false,
        }
    }
}

/// 一门课程的变更，只由 diff 引擎产生
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub kind: ChangeKind,
    pub title: String,
    pub fields: Vec<ChangeField>,
}
