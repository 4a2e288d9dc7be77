use micro_ssve::{SsveError, ViewEngineHost};
use micro_view::{Model, html_encode};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    file: TestFile,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, file: TestFile) -> Self {
        Self { name, group, file }
    }

    pub fn small(name: &'static str, file: TestFile) -> Self {
        Self::new(name, TestGroup::Small, file)
    }

    pub fn normal(name: &'static str, file: TestFile) -> Self {
        Self::new(name, TestGroup::Normal, file)
    }

    pub fn large(name: &'static str, file: TestFile) -> Self {
        Self::new(name, TestGroup::Large, file)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn file(&self) -> &TestFile {
        &self.file
    }

    pub fn file_name(&self) -> &'static str {
        self.file().file_name
    }

    /// A model sized for the case's group.
    pub fn model(&self) -> Model {
        Model::members("UserListModel", user_list(self.group.users()))
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TestFile {
    file_name: &'static str,
    content: &'static str,
}

impl TestFile {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }

    /// The file name without its extension, the name templates refer to it by.
    pub fn view_name(&self) -> &'static str {
        self.file_name.rsplit_once('.').map_or(self.file_name, |(name, _)| name)
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Normal,
    Large,
}

impl TestGroup {
    pub fn users(self) -> usize {
        match self {
            TestGroup::Small => 1,
            TestGroup::Normal => 20,
            TestGroup::Large => 500,
        }
    }
}

/// Serves partials and master pages from a fixed set of files.
#[derive(Debug, Default)]
pub struct StaticHost {
    templates: HashMap<&'static str, Arc<String>>,
}

impl StaticHost {
    pub fn new(files: &[TestFile]) -> Self {
        let templates = files.iter().map(|file| (file.view_name(), Arc::new(file.content().to_string()))).collect();
        Self { templates }
    }
}

impl ViewEngineHost for StaticHost {
    fn html_encode(&self, input: &str) -> String {
        html_encode(input)
    }

    fn get_template(&self, template_name: &str, _model: Option<&Model>) -> Option<Arc<String>> {
        self.templates.get(template_name).cloned()
    }

    fn expand_path(&self, path: &str) -> String {
        path.strip_prefix('~').map_or_else(|| path.to_string(), |rest| format!("/bench{rest}"))
    }

    fn anti_forgery_token(&self) -> Result<String, SsveError> {
        Ok(r#"<input type="hidden" name="_csrf" value="bench"/>"#.to_string())
    }

    fn text(&self, key: &str) -> Option<String> {
        Some(key.to_string())
    }
}

fn user_list(users: usize) -> Value {
    let users = (0..users)
        .map(|id| json!({ "Id": id, "Name": format!("<user {id}>"), "Email": format!("user{id}@example.com") }))
        .collect::<Vec<_>>();
    let total = users.len();
    let tags = ["admin", "staff", "guest"]
        .iter()
        .enumerate()
        .map(|(index, kind)| json!({ "Kind": kind, "Label": kind.to_uppercase(), "Pinned": index == 0 }))
        .collect::<Vec<_>>();

    json!({
        "Title": "Users & Roles",
        "Name": "bench",
        "Unread": 3,
        "Total": total,
        "Users": users,
        "Tags": tags,
        "Footer": "generated",
    })
}
