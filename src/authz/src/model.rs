//! Access-control model
//!
//! A model declares the request shape and the matching expression a grant
//! must satisfy. The expression is parsed once at load time into a list of
//! typed [`Condition`]s that are all required to hold; nothing is evaluated
//! from strings at request time.
//!
//! # Model text
//!
//! ```text
//! [request_definition]
//! r = sub, obj, act
//!
//! [policy_definition]
//! p = sub, obj, act
//!
//! [role_definition]
//! g = _, _
//!
//! [policy_effect]
//! e = some(where (p.eft == allow))
//!
//! [matchers]
//! m = g(r.sub, p.sub) && keyMatch(r.obj, p.obj) && (r.act == p.act || p.act == "*")
//! ```
//!
//! Field names are free; their position decides what they mean (subject,
//! object, action).

use crate::error::{AuthzError, Result};
use crate::roles::RoleGraph;
use crate::store::StoredGrant;
use crate::types::{GrantRule, Request};
use std::path::Path;

/// Built-in RBAC model with single-segment path wildcards
pub const DEFAULT_MODEL_CONF: &str = r#"
[request_definition]
r = sub, obj, act

[policy_definition]
p = sub, obj, act

[role_definition]
g = _, _

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = g(r.sub, p.sub) && keyMatch(r.obj, p.obj) && (r.act == p.act || p.act == "*")
"#;

const ALLOW_OVERRIDE_EFFECT: &str = "some(where(p.eft==allow))";

/// Position in the request / grant triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Subject,
    Object,
    Action,
}

impl Field {
    const ALL: [Field; 3] = [Field::Subject, Field::Object, Field::Action];

    fn of_request(self, request: &Request) -> &str {
        match self {
            Field::Subject => &request.subject,
            Field::Object => &request.object,
            Field::Action => &request.action,
        }
    }

    fn of_rule(self, rule: &GrantRule) -> &str {
        match self {
            Field::Subject => &rule.subject,
            Field::Object => &rule.object,
            Field::Action => &rule.action,
        }
    }
}

/// One conjunct of the matching expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// `r.F == p.F`
    Exact(Field),
    /// `(r.F == p.F || p.F == "*")`
    ExactOrAny(Field),
    /// `keyMatch(r.obj, p.obj)`
    PathWildcard(Field),
    /// `g(r.sub, p.sub)`
    RoleOrEqual(Field),
}

impl Condition {
    fn holds(self, request: &Request, grant: &StoredGrant, roles: &RoleGraph) -> bool {
        let rule = grant.rule();
        match self {
            Condition::Exact(field) => field.of_request(request) == field.of_rule(rule),
            Condition::ExactOrAny(Field::Action) => grant.action_pattern().matches(&request.action),
            Condition::ExactOrAny(field) => {
                let pattern = field.of_rule(rule);
                pattern == "*" || pattern == field.of_request(request)
            }
            Condition::PathWildcard(_) => grant.object_pattern().matches(&request.object),
            Condition::RoleOrEqual(_) => {
                request.subject == rule.subject || roles.has_role(&request.subject, &rule.subject)
            }
        }
    }
}

/// Parsed access-control model, immutable once loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    request_fields: [String; 3],
    policy_fields: [String; 3],
    conditions: Vec<Condition>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            request_fields: ["sub".into(), "obj".into(), "act".into()],
            policy_fields: ["sub".into(), "obj".into(), "act".into()],
            conditions: vec![
                Condition::RoleOrEqual(Field::Subject),
                Condition::PathWildcard(Field::Object),
                Condition::ExactOrAny(Field::Action),
            ],
        }
    }
}

impl Model {
    /// Parse a model from its text form
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::PolicyFormat`] for missing or unknown sections,
    /// definitions that are not three fields wide, effects other than
    /// allow-override, and matcher constructs outside the supported set.
    pub fn from_conf(text: &str) -> Result<Self> {
        ModelParser::default().parse(text)
    }

    /// Read and parse a model file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_conf(&text)
    }

    /// The request field names, in subject/object/action order
    pub fn request_fields(&self) -> &[String; 3] {
        &self.request_fields
    }

    /// The policy field names, in subject/object/action order
    pub fn policy_fields(&self) -> &[String; 3] {
        &self.policy_fields
    }

    /// The conjuncts of the matching expression
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Check whether a single grant permits the request
    pub fn matches(&self, request: &Request, grant: &StoredGrant, roles: &RoleGraph) -> bool {
        self.conditions
            .iter()
            .all(|condition| condition.holds(request, grant, roles))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Request,
    Policy,
    Role,
    Effect,
    Matchers,
}

#[derive(Default)]
struct ModelParser {
    request: Option<[String; 3]>,
    policy: Option<[String; 3]>,
    role: bool,
    effect: bool,
    matcher: Option<(usize, String)>,
    /// Last line of the source; missing sections are reported against it
    last_line: usize,
}

impl ModelParser {
    fn parse(mut self, text: &str) -> Result<Model> {
        let mut section: Option<Section> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = Some(parse_section(line_no, name.trim())?);
                continue;
            }

            let Some(current) = section else {
                return Err(AuthzError::policy_format(line_no, "definition outside of a section"));
            };

            let Some((key, value)) = line.split_once('=') else {
                return Err(AuthzError::policy_format(line_no, format!("expected 'key = value', got '{}'", line)));
            };

            self.assign(line_no, current, key.trim(), value.trim())?;
        }

        self.last_line = text.lines().count().max(1);
        self.finish()
    }

    fn assign(&mut self, line_no: usize, section: Section, key: &str, value: &str) -> Result<()> {
        let expected = match section {
            Section::Request => "r",
            Section::Policy => "p",
            Section::Role => "g",
            Section::Effect => "e",
            Section::Matchers => "m",
        };
        if key != expected {
            return Err(AuthzError::policy_format(
                line_no,
                format!("unsupported key '{}' (expected '{}')", key, expected),
            ));
        }

        match section {
            Section::Request => self.request = Some(parse_fields(line_no, value)?),
            Section::Policy => self.policy = Some(parse_fields(line_no, value)?),
            Section::Role => {
                let args: Vec<&str> = value.split(',').map(str::trim).collect();
                if args != ["_", "_"] {
                    return Err(AuthzError::policy_format(
                        line_no,
                        "only a two-place role definition 'g = _, _' is supported",
                    ));
                }
                self.role = true;
            }
            Section::Effect => {
                let normalized: String = value.chars().filter(|c| !c.is_whitespace()).collect();
                if normalized != ALLOW_OVERRIDE_EFFECT {
                    return Err(AuthzError::policy_format(
                        line_no,
                        format!("unsupported policy effect '{}'", value),
                    ));
                }
                self.effect = true;
            }
            Section::Matchers => self.matcher = Some((line_no, value.to_string())),
        }

        Ok(())
    }

    fn finish(self) -> Result<Model> {
        let end = self.last_line;
        let request_fields = self
            .request
            .ok_or_else(|| AuthzError::policy_format(end, "missing [request_definition]"))?;
        let policy_fields = self
            .policy
            .ok_or_else(|| AuthzError::policy_format(end, "missing [policy_definition]"))?;
        if !self.effect {
            return Err(AuthzError::policy_format(end, "missing [policy_effect]"));
        }
        let (line_no, expr) = self
            .matcher
            .ok_or_else(|| AuthzError::policy_format(end, "missing [matchers]"))?;

        let resolver = FieldResolver {
            line_no,
            request: &request_fields,
            policy: &policy_fields,
        };

        let mut conditions = Vec::new();
        for conjunct in split_top_level(&expr, "&&") {
            let condition = resolver.condition(strip_parens(conjunct.trim()))?;
            if matches!(condition, Condition::RoleOrEqual(_)) && !self.role {
                return Err(AuthzError::policy_format(
                    line_no,
                    "g() used without a [role_definition]",
                ));
            }
            conditions.push(condition);
        }

        Ok(Model {
            request_fields,
            policy_fields,
            conditions,
        })
    }
}

fn parse_section(line_no: usize, name: &str) -> Result<Section> {
    match name {
        "request_definition" => Ok(Section::Request),
        "policy_definition" => Ok(Section::Policy),
        "role_definition" => Ok(Section::Role),
        "policy_effect" => Ok(Section::Effect),
        "matchers" => Ok(Section::Matchers),
        other => Err(AuthzError::policy_format(line_no, format!("unknown section [{}]", other))),
    }
}

fn parse_fields(line_no: usize, value: &str) -> Result<[String; 3]> {
    let fields: Vec<String> = value.split(',').map(|f| f.trim().to_string()).collect();

    if fields.iter().any(String::is_empty) {
        return Err(AuthzError::policy_format(line_no, "empty field name"));
    }

    let fields: [String; 3] = fields.try_into().map_err(|fields: Vec<String>| {
        AuthzError::policy_format(
            line_no,
            format!("expected 3 fields (subject, object, action), got {}", fields.len()),
        )
    })?;

    if fields[0] == fields[1] || fields[1] == fields[2] || fields[0] == fields[2] {
        return Err(AuthzError::policy_format(line_no, "duplicate field name"));
    }

    Ok(fields)
}

/// Maps `r.<name>` / `p.<name>` operands to triple positions
struct FieldResolver<'a> {
    line_no: usize,
    request: &'a [String; 3],
    policy: &'a [String; 3],
}

impl FieldResolver<'_> {
    fn error(&self, message: impl Into<String>) -> AuthzError {
        AuthzError::policy_format(self.line_no, message)
    }

    fn operand(&self, token: &str) -> Result<(char, Field)> {
        let token = token.trim();
        let (prefix, name, fields) = match token.split_once('.') {
            Some(("r", name)) => ('r', name, self.request),
            Some(("p", name)) => ('p', name, self.policy),
            _ => return Err(self.error(format!("unsupported operand '{}'", token))),
        };

        fields
            .iter()
            .position(|f| f == name)
            .map(|idx| (prefix, Field::ALL[idx]))
            .ok_or_else(|| self.error(format!("unknown field '{}'", token)))
    }

    /// Resolve `r.X` and `p.X` naming the same position
    fn pair(&self, left: &str, right: &str) -> Result<Field> {
        match (self.operand(left)?, self.operand(right)?) {
            (('r', a), ('p', b)) | (('p', b), ('r', a)) if a == b => Ok(a),
            _ => Err(self.error(format!(
                "'{}' and '{}' must compare the same request and policy field",
                left.trim(),
                right.trim()
            ))),
        }
    }

    fn call_args<'e>(&self, expr: &'e str, name: &str) -> Option<(&'e str, &'e str)> {
        expr.strip_prefix(name)?
            .trim_start()
            .strip_prefix('(')?
            .strip_suffix(')')?
            .split_once(',')
    }

    fn condition(&self, expr: &str) -> Result<Condition> {
        let alternatives = split_top_level(expr, "||");
        if alternatives.len() == 2 {
            return self.exact_or_any(alternatives[0], alternatives[1]);
        }
        if alternatives.len() > 2 {
            return Err(self.error(format!("unsupported disjunction '{}'", expr)));
        }

        if let Some((left, right)) = self.call_args(expr, "g") {
            let field = self.pair(left, right)?;
            if field != Field::Subject {
                return Err(self.error("g() only applies to the subject field"));
            }
            return Ok(Condition::RoleOrEqual(field));
        }

        if let Some((left, right)) = self.call_args(expr, "keyMatch") {
            let field = self.pair(left, right)?;
            if field != Field::Object {
                return Err(self.error("keyMatch() only applies to the object field"));
            }
            return Ok(Condition::PathWildcard(field));
        }

        if let Some((left, right)) = expr.split_once("==") {
            return Ok(Condition::Exact(self.pair(left, right)?));
        }

        Err(self.error(format!("unsupported matcher expression '{}'", expr)))
    }

    /// `r.F == p.F || p.F == "*"`, in either order
    fn exact_or_any(&self, first: &str, second: &str) -> Result<Condition> {
        let wildcard_field = |side: &str| -> Option<Field> {
            let (left, right) = side.split_once("==")?;
            let literal = right.trim();
            if literal != "\"*\"" && literal != "'*'" {
                return None;
            }
            match self.operand(left).ok()? {
                ('p', field) => Some(field),
                _ => None,
            }
        };

        let (equality, any) = match (wildcard_field(first), wildcard_field(second)) {
            (None, Some(field)) => (first, field),
            (Some(field), None) => (second, field),
            _ => return Err(self.error("expected '(r.F == p.F || p.F == \"*\")'")),
        };

        let (left, right) = equality
            .split_once("==")
            .ok_or_else(|| self.error(format!("expected an equality, got '{}'", equality.trim())))?;
        let field = self.pair(left, right)?;
        if field != any {
            return Err(self.error("wildcard alternative must name the compared field"));
        }

        Ok(Condition::ExactOrAny(field))
    }
}

/// Split on `sep` where it is not nested in parentheses or quotes
fn split_top_level<'e>(expr: &'e str, sep: &str) -> Vec<&'e str> {
    let bytes = expr.as_bytes();
    let mut parts = Vec::new();
    let mut depth: i32 = 0;
    let mut quote: Option<u8> = None;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'(' => depth += 1,
                b')' => depth -= 1,
                _ if depth == 0 && bytes[i..].starts_with(sep.as_bytes()) => {
                    parts.push(&expr[start..i]);
                    i += sep.len();
                    start = i;
                    continue;
                }
                _ => {}
            },
        }
        i += 1;
    }

    parts.push(&expr[start..]);
    parts
}

/// Remove parentheses wrapping the whole expression
fn strip_parens(mut expr: &str) -> &str {
    loop {
        let Some(inner) = expr.strip_prefix('(').and_then(|e| e.strip_suffix(')')) else {
            return expr;
        };

        // "(a) && (b)" starts and ends with parens but is not wrapped
        let mut depth = 0;
        for (idx, b) in inner.bytes().enumerate() {
            match b {
                b'(' => depth += 1,
                b')' if depth == 0 => return expr,
                b')' => depth -= 1,
                _ => {}
            }
            if idx == inner.len() - 1 && depth != 0 {
                return expr;
            }
        }

        expr = inner.trim();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(subject: &str, object: &str, action: &str) -> StoredGrant {
        StoredGrant::compile(GrantRule::new(subject, object, action)).unwrap()
    }

    #[test]
    fn test_default_conf_parses_to_default_model() {
        let model = Model::from_conf(DEFAULT_MODEL_CONF).unwrap();
        assert_eq!(model, Model::default());
    }

    #[test]
    fn test_field_names_are_positional() {
        let conf = r#"
[request_definition]
r = user, path, method
[policy_definition]
p = user, path, method
[role_definition]
g = _, _
[policy_effect]
e = some(where (p.eft == allow))
[matchers]
m = g(r.user, p.user) && keyMatch(r.path, p.path) && (r.method == p.method || p.method == "*")
"#;
        let model = Model::from_conf(conf).unwrap();
        assert_eq!(model.conditions(), Model::default().conditions());
        assert_eq!(model.request_fields()[2], "method");
    }

    #[test]
    fn test_exact_only_model() {
        let conf = r#"
[request_definition]
r = sub, obj, act
[policy_definition]
p = sub, obj, act
[policy_effect]
e = some(where (p.eft == allow))
[matchers]
m = r.sub == p.sub && r.obj == p.obj && r.act == p.act
"#;
        let model = Model::from_conf(conf).unwrap();
        assert_eq!(
            model.conditions(),
            &[
                Condition::Exact(Field::Subject),
                Condition::Exact(Field::Object),
                Condition::Exact(Field::Action),
            ]
        );

        let roles = RoleGraph::new();
        let g = grant("alice", "/data/*", "GET");
        assert!(model.matches(&Request::new("alice", "/data/*", "GET"), &g, &roles));
        assert!(!model.matches(&Request::new("alice", "/data/x", "GET"), &g, &roles));
    }

    #[test]
    fn test_default_model_matching() {
        let model = Model::default();
        let mut roles = RoleGraph::new();
        roles.add_link("cathy", "dataset1_admin");

        let admin = grant("dataset1_admin", "/dataset1/*", "*");
        assert!(model.matches(&Request::new("cathy", "/dataset1/item", "DELETE"), &admin, &roles));
        assert!(!model.matches(&Request::new("cathy", "/dataset2/item", "GET"), &admin, &roles));
        assert!(!model.matches(&Request::new("bob", "/dataset1/item", "GET"), &admin, &roles));
    }

    #[test]
    fn test_rejects_unsupported_effect() {
        let conf = DEFAULT_MODEL_CONF.replace(
            "some(where (p.eft == allow))",
            "!some(where (p.eft == deny))",
        );
        assert!(matches!(
            Model::from_conf(&conf),
            Err(AuthzError::PolicyFormat { line: 12, .. })
        ));
    }

    #[test]
    fn test_rejects_missing_sections() {
        let conf = "[request_definition]\nr = sub, obj, act\n";
        assert!(matches!(
            Model::from_conf(conf),
            Err(AuthzError::PolicyFormat { line: 2, ref message }) if message.contains("[policy_definition]")
        ));

        assert!(matches!(
            Model::from_conf(""),
            Err(AuthzError::PolicyFormat { line: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_wrong_arity() {
        let conf = DEFAULT_MODEL_CONF.replace("r = sub, obj, act", "r = sub, dom, obj, act");
        assert!(matches!(
            Model::from_conf(&conf),
            Err(AuthzError::PolicyFormat { line: 3, .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_function() {
        let conf = DEFAULT_MODEL_CONF.replace("keyMatch(r.obj, p.obj)", "regexMatch(r.obj, p.obj)");
        assert!(Model::from_conf(&conf).is_err());
    }

    #[test]
    fn test_rejects_mismatched_fields() {
        let conf = DEFAULT_MODEL_CONF.replace("keyMatch(r.obj, p.obj)", "keyMatch(r.obj, p.act)");
        assert!(Model::from_conf(&conf).is_err());

        let conf = DEFAULT_MODEL_CONF.replace("g(r.sub, p.sub)", "g(r.obj, p.obj)");
        assert!(Model::from_conf(&conf).is_err());
    }

    #[test]
    fn test_rejects_role_matcher_without_role_definition() {
        let conf = DEFAULT_MODEL_CONF.replace("g = _, _", "");
        assert!(Model::from_conf(&conf).is_err());
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split_top_level("a && (b && c) && d", "&&"),
            vec!["a ", " (b && c) ", " d"]
        );
        assert_eq!(split_top_level("p.act == \"&&\"", "&&"), vec!["p.act == \"&&\""]);
    }

    #[test]
    fn test_strip_parens() {
        assert_eq!(strip_parens("((a || b))"), "a || b");
        assert_eq!(strip_parens("(a) || (b)"), "(a) || (b)");
        assert_eq!(strip_parens("g(a, b)"), "g(a, b)");
    }
}
