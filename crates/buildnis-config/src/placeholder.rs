//! `${...}` placeholder expansion
//!
//! Every string in a document may reference
//!
//! - a reserved constant such as `${PROJECT_NAME}` or `${YEAR}`, or
//! - a field of an enclosing scope, `${NAME}` for the innermost scope and
//!   `${../NAME}`, `${../../NAME}` for scopes further out.
//!
//! # Scope chain
//!
//! Expansion walks the tree depth first and keeps the enclosing containers
//! in a stack of [`Frame`]s, nearest last. Entering an object pushes it. An
//! object that is an element of an array pushes the owning array instead of
//! itself; arrays nested in arrays push nothing. An array frame never
//! resolves a name.
//!
//! # Substitution
//!
//! Constants are tried first, in registry order. The first constant present
//! in the string has all its occurrences replaced and nothing else happens
//! to that string in the pass. Otherwise only the first `${...}` in the
//! string is looked up. A string substitute is spliced in place of the
//! placeholder; any other value replaces the whole string.
//!
//! Names that cannot be resolved are left untouched. Forward references and
//! late bindings stay valid this way, at the cost of typos going unnoticed;
//! [`unresolved_placeholders`] lists what is left after expansion.
//!
//! A pass only reads the tree as it was before the pass, so the result does
//! not depend on field order. Chained references need more than one pass,
//! see [`PlaceholderResolver::resolve_until_stable`].

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::{ConfigNode, Map, ProjectDocument, Value};

/// `${` + any number of `../` + a name without `}` + `}`
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{((?:\.\./)*)([^}]*)\}").expect("placeholder pattern is valid")
});

pub const PROJECT_ROOT: &str = "PROJECT_ROOT";
pub const PROJECT_NAME: &str = "PROJECT_NAME";
pub const PROJECT_VERSION: &str = "PROJECT_VERSION";
pub const PROJECT_AUTHOR: &str = "PROJECT_AUTHOR";
pub const PROJECT_COMPANY: &str = "PROJECT_COMPANY";
pub const PROJECT_COPYRIGHT_INFO: &str = "PROJECT_COPYRIGHT_INFO";
pub const PROJECT_WEB_URL: &str = "PROJECT_WEB_URL";
pub const PROJECT_EMAIL: &str = "PROJECT_EMAIL";
pub const PROJECT_CONFIG_DIR_PATH: &str = "PROJECT_CONFIG_DIR_PATH";
pub const HOST_OS: &str = "HOST_OS";
pub const HOST_NAME: &str = "HOST_NAME";
pub const HOST_CPU_ARCH: &str = "HOST_CPU_ARCH";
pub const HOST_NUM_CORES: &str = "HOST_NUM_CORES";
pub const HOST_NUM_LOG_CORES: &str = "HOST_NUM_LOG_CORES";
pub const TIME: &str = "TIME";
pub const DATE: &str = "DATE";
pub const YEAR: &str = "YEAR";
pub const MONTH: &str = "MONTH";
pub const DAY: &str = "DAY";
pub const OS_NAME_WINDOWS: &str = "OS_NAME_WINDOWS";
pub const OS_NAME_LINUX: &str = "OS_NAME_LINUX";
pub const OS_NAME_OSX: &str = "OS_NAME_OSX";

/// Reserved constant names in lookup order.
pub const CONSTANT_NAMES: [&str; 22] = [
    PROJECT_ROOT,
    PROJECT_NAME,
    PROJECT_VERSION,
    PROJECT_AUTHOR,
    PROJECT_COMPANY,
    PROJECT_COPYRIGHT_INFO,
    PROJECT_WEB_URL,
    PROJECT_EMAIL,
    PROJECT_CONFIG_DIR_PATH,
    HOST_OS,
    HOST_NAME,
    HOST_CPU_ARCH,
    HOST_NUM_CORES,
    HOST_NUM_LOG_CORES,
    TIME,
    DATE,
    YEAR,
    MONTH,
    DAY,
    OS_NAME_WINDOWS,
    OS_NAME_LINUX,
    OS_NAME_OSX,
];

/// Values of the reserved constants for one run.
///
/// Built once after the project is loaded and handed to the resolver. Date
/// and time constants come from the clock captured at construction, so every
/// document of a run sees the same instant.
#[derive(Debug, Clone)]
pub struct Constants {
    values: Vec<(&'static str, String)>,
    clock: NaiveDateTime,
}

impl Default for Constants {
    fn default() -> Self {
        Self::new()
    }
}

impl Constants {
    /// Constants with only the clock and the OS names set.
    pub fn new() -> Self {
        Self::with_clock(chrono::Local::now().naive_local())
    }

    pub fn with_clock(clock: NaiveDateTime) -> Self {
        let mut constants = Self {
            values: Vec::new(),
            clock,
        };
        constants.set(OS_NAME_WINDOWS, "Windows");
        constants.set(OS_NAME_LINUX, "Linux");
        constants.set(OS_NAME_OSX, "OSX");
        constants
    }

    /// Set a reserved constant. Names outside [`CONSTANT_NAMES`] are ignored.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let Some(name) = CONSTANT_NAMES.iter().copied().find(|known| *known == name) else {
            tracing::warn!(name, "Ignoring unknown placeholder constant");
            return;
        };
        let value = value.into();
        match self.values.iter_mut().find(|(known, _)| *known == name) {
            Some(entry) => entry.1 = value,
            None => self.values.push((name, value)),
        }
    }

    /// Fill the `PROJECT_*` constants from a loaded project.
    pub fn set_project(&mut self, project: &ProjectDocument, config_dir: &str) {
        self.set(PROJECT_ROOT, project.project_dir().as_str());
        self.set(PROJECT_NAME, project.name());
        self.set(PROJECT_VERSION, project.version());
        self.set(PROJECT_AUTHOR, project.author());
        self.set(PROJECT_COMPANY, project.company());
        self.set(PROJECT_COPYRIGHT_INFO, project.copyright_info());
        self.set(PROJECT_WEB_URL, project.web_url());
        self.set(PROJECT_EMAIL, project.email());
        self.set(PROJECT_CONFIG_DIR_PATH, config_dir);
    }

    /// The value of a constant, if it has one.
    pub fn get(&self, name: &str) -> Option<String> {
        let format = match name {
            TIME => "%H:%M:%S",
            DATE => "%d.%m.%Y",
            YEAR => "%Y",
            MONTH => "%m",
            DAY => "%d",
            _ => {
                return self
                    .values
                    .iter()
                    .find(|(known, _)| *known == name)
                    .map(|(_, value)| value.clone());
            }
        };
        Some(self.clock.format(format).to_string())
    }

    /// Replace the first constant found in `text`, every occurrence of it.
    ///
    /// Returns `None` when `text` references no constant that has a value.
    pub fn substitute(&self, text: &str) -> Option<String> {
        if !text.contains("${") {
            return None;
        }
        CONSTANT_NAMES.iter().find_map(|name| {
            let token = format!("${{{}}}", name);
            if !text.contains(&token) {
                return None;
            }
            self.get(name).map(|value| text.replace(&token, &value))
        })
    }
}

/// One enclosing scope during expansion.
#[derive(Debug, Clone, Copy)]
pub enum Frame<'a> {
    Node(&'a Map<String, Value>),
    Sequence(&'a [Value]),
}

impl<'a> Frame<'a> {
    fn lookup(&self, name: &str) -> Option<&'a Value> {
        match *self {
            Frame::Node(map) => map.get(name),
            Frame::Sequence(_) => None,
        }
    }
}

impl<'a> From<&'a ConfigNode> for Frame<'a> {
    fn from(node: &'a ConfigNode) -> Self {
        Frame::Node(node.as_map())
    }
}

/// Result of [`PlaceholderResolver::resolve_until_stable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expansion {
    /// Passes run, including the one that found nothing left to change.
    pub passes: usize,
    /// False if the tree still changed in the last allowed pass.
    pub stable: bool,
}

/// Expands placeholders in configuration trees.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderResolver {
    constants: Constants,
}

impl PlaceholderResolver {
    pub fn new(constants: Constants) -> Self {
        Self { constants }
    }

    pub fn constants(&self) -> &Constants {
        &self.constants
    }

    /// One expansion pass over `root` with `root` as the only scope.
    pub fn resolve<'n>(&self, root: &'n mut ConfigNode) -> &'n mut ConfigNode {
        self.resolve_with_parents(root, &[])
    }

    /// One expansion pass over `root` with `parents` (outermost first) as
    /// enclosing scopes.
    pub fn resolve_with_parents<'n>(
        &self,
        root: &'n mut ConfigNode,
        parents: &[&ConfigNode],
    ) -> &'n mut ConfigNode {
        let resolved = {
            let mut chain: Vec<Frame<'_>> = parents.iter().map(|p| Frame::from(*p)).collect();
            self.resolve_map(root.as_map(), &mut chain)
        };
        *root.as_map_mut() = resolved;
        root
    }

    /// Repeat passes until the tree stops changing, at most `limit` times.
    pub fn resolve_until_stable(
        &self,
        root: &mut ConfigNode,
        parents: &[&ConfigNode],
        limit: usize,
    ) -> Expansion {
        for pass in 1..=limit {
            let before = root.clone();
            self.resolve_with_parents(root, parents);
            if *root == before {
                return Expansion {
                    passes: pass,
                    stable: true,
                };
            }
        }
        Expansion {
            passes: limit,
            stable: false,
        }
    }

    /// Expand a single string against an explicit scope chain.
    pub fn expand_str(&self, text: &str, chain: &[Frame<'_>]) -> Value {
        if let Some(replaced) = self.constants.substitute(text) {
            return Value::String(replaced);
        }

        let unchanged = || Value::String(text.to_string());
        let Some(captures) = PLACEHOLDER.captures(text) else {
            return unchanged();
        };
        let Some(whole) = captures.get(0) else {
            return unchanged();
        };
        let depth = captures.get(1).map_or(0, |m| m.as_str().len() / 3);
        let name = captures.get(2).map_or("", |m| m.as_str());

        let Some(frame) = chain
            .len()
            .checked_sub(depth + 1)
            .and_then(|index| chain.get(index))
        else {
            return unchanged();
        };
        match frame.lookup(name) {
            Some(Value::String(substitute)) => {
                let mut spliced = String::with_capacity(text.len() + substitute.len());
                spliced.push_str(&text[..whole.start()]);
                spliced.push_str(substitute);
                spliced.push_str(&text[whole.end()..]);
                Value::String(spliced)
            }
            Some(other) => other.clone(),
            None => unchanged(),
        }
    }

    fn resolve_map<'a>(
        &self,
        map: &'a Map<String, Value>,
        chain: &mut Vec<Frame<'a>>,
    ) -> Map<String, Value> {
        chain.push(Frame::Node(map));
        let resolved = self.resolve_fields(map, chain);
        chain.pop();
        resolved
    }

    fn resolve_fields<'a>(
        &self,
        map: &'a Map<String, Value>,
        chain: &mut Vec<Frame<'a>>,
    ) -> Map<String, Value> {
        map.iter()
            .map(|(field, value)| (field.clone(), self.resolve_value(value, chain)))
            .collect()
    }

    fn resolve_sequence<'a>(&self, items: &'a [Value], chain: &mut Vec<Frame<'a>>) -> Vec<Value> {
        let mut resolved = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::Object(map) => {
                    chain.push(Frame::Sequence(items));
                    resolved.push(Value::Object(self.resolve_fields(map, chain)));
                    chain.pop();
                }
                other => resolved.push(self.resolve_value(other, chain)),
            }
        }
        resolved
    }

    fn resolve_value<'a>(&self, value: &'a Value, chain: &mut Vec<Frame<'a>>) -> Value {
        match value {
            Value::String(text) => self.expand_str(text, chain),
            Value::Object(map) => Value::Object(self.resolve_map(map, chain)),
            Value::Array(items) => Value::Array(self.resolve_sequence(items, chain)),
            other => other.clone(),
        }
    }
}

/// Every placeholder still present in `node`, in document order.
pub fn unresolved_placeholders(node: &ConfigNode) -> Vec<String> {
    fn collect(value: &Value, found: &mut Vec<String>) {
        match value {
            Value::String(text) => {
                found.extend(PLACEHOLDER.find_iter(text).map(|m| m.as_str().to_string()))
            }
            Value::Array(items) => items.iter().for_each(|item| collect(item, found)),
            Value::Object(map) => map.values().for_each(|item| collect(item, found)),
            _ => {}
        }
    }

    let mut found = Vec::new();
    node.iter().for_each(|(_, value)| collect(value, &mut found));
    found
}
