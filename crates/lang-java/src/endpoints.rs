//! Spring MVC endpoint discovery over an indexed project.
//!
//! Handlers are methods of `@RestController` / `@Controller` types carrying a
//! mapping annotation. Their `EntryRef`s feed straight into the analyzer.

use chainscope_api::models::source::Annotation;
use chainscope_api::EntryRef;
use chainscope_core::SymbolIndex;
use chainscope_core::index::{MethodDeclaration, TypeDeclaration};
use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

static REPEATED_SLASHES: Lazy<Regex> = Lazy::new(|| Regex::new("/{2,}").expect("valid regex"));
static REQUEST_METHOD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(GET|POST|PUT|DELETE|PATCH|HEAD|OPTIONS)\b").expect("valid regex"));

const CONTROLLER_ANNOTATIONS: &[&str] = &["RestController", "Controller"];

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    fn from_mapping(annotation: &str) -> Option<Self> {
        match annotation {
            "GetMapping" => Some(HttpMethod::Get),
            "PostMapping" => Some(HttpMethod::Post),
            "PutMapping" => Some(HttpMethod::Put),
            "DeleteMapping" => Some(HttpMethod::Delete),
            "PatchMapping" => Some(HttpMethod::Patch),
            _ => None,
        }
    }

    fn from_verb(verb: &str) -> Option<Self> {
        match verb {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "DELETE" => Some(HttpMethod::Delete),
            "PATCH" => Some(HttpMethod::Patch),
            "HEAD" => Some(HttpMethod::Head),
            "OPTIONS" => Some(HttpMethod::Options),
            _ => None,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct Endpoint {
    pub http_method: HttpMethod,
    pub path: String,
    pub handler: EntryRef,
    pub file: PathBuf,
    pub line: u32,
}

/// Every endpoint of every controller, ordered by path then HTTP method.
pub fn discover(index: &SymbolIndex) -> Vec<Endpoint> {
    let mut endpoints: Vec<Endpoint> = index
        .types()
        .filter(|decl| is_controller(decl))
        .flat_map(controller_endpoints)
        .collect();
    endpoints.sort_by(|a, b| {
        (&a.path, a.http_method, &a.handler.type_name, &a.handler.method).cmp(&(
            &b.path,
            b.http_method,
            &b.handler.type_name,
            &b.handler.method,
        ))
    });
    endpoints.dedup_by(|a, b| a.path == b.path && a.http_method == b.http_method && a.handler == b.handler);
    info!(endpoints = endpoints.len(), "endpoints discovered");
    endpoints
}

fn is_controller(decl: &TypeDeclaration) -> bool {
    decl.annotations
        .iter()
        .any(|a| CONTROLLER_ANNOTATIONS.contains(&a.simple_name()))
}

fn controller_endpoints(decl: &TypeDeclaration) -> Vec<Endpoint> {
    let base_paths = decl
        .annotations
        .iter()
        .find(|a| a.simple_name() == "RequestMapping")
        .map(mapping_paths)
        .unwrap_or_else(|| vec![String::new()]);

    let mut endpoints = Vec::new();
    for method in decl.methods.iter().filter(|m| !m.constructor) {
        for annotation in &method.annotations {
            let Some(verbs) = mapping_verbs(annotation) else {
                continue;
            };
            for base in &base_paths {
                for sub in mapping_paths(annotation) {
                    for &http_method in &verbs {
                        endpoints.push(endpoint(decl, method, http_method, join_paths(base, &sub)));
                    }
                }
            }
        }
    }
    debug!(controller = %decl.fqn, endpoints = endpoints.len(), "controller scanned");
    endpoints
}

fn endpoint(decl: &TypeDeclaration, method: &MethodDeclaration, http_method: HttpMethod, path: String) -> Endpoint {
    Endpoint {
        http_method,
        path,
        handler: EntryRef::new(decl.fqn.clone(), method.name.clone()).with_arity(method.parameters.len()),
        file: decl.file.clone(),
        line: method.line,
    }
}

/// HTTP methods a mapping annotation serves; `None` if it is not a mapping.
///
/// `@RequestMapping` without `method` is reported as GET.
fn mapping_verbs(annotation: &Annotation) -> Option<Vec<HttpMethod>> {
    let name = annotation.simple_name();
    if let Some(method) = HttpMethod::from_mapping(name) {
        return Some(vec![method]);
    }
    if name != "RequestMapping" {
        return None;
    }
    let mut verbs: Vec<HttpMethod> = annotation
        .argument("method")
        .map(|value| {
            REQUEST_METHOD
                .find_iter(value)
                .filter_map(|m| HttpMethod::from_verb(m.as_str()))
                .collect()
        })
        .unwrap_or_default();
    verbs.dedup();
    if verbs.is_empty() {
        verbs.push(HttpMethod::Get);
    }
    Some(verbs)
}

/// Paths of a mapping: `value`, else `path`. Array values yield one path each.
fn mapping_paths(annotation: &Annotation) -> Vec<String> {
    let raw = annotation
        .value
        .as_deref()
        .or_else(|| annotation.argument("path"))
        .or_else(|| annotation.argument("value"))
        .unwrap_or("");
    let inner = raw.trim().trim_start_matches('{').trim_end_matches('}');
    let paths: Vec<String> = inner
        .split(',')
        .map(|p| p.trim().trim_matches('"').trim().to_string())
        .collect();
    if paths.iter().all(String::is_empty) {
        vec![String::new()]
    } else {
        paths.into_iter().filter(|p| !p.is_empty()).collect()
    }
}

pub fn join_paths(base: &str, sub: &str) -> String {
    let joined = format!("/{}/{}", base.trim(), sub.trim());
    let collapsed = REPEATED_SLASHES.replace_all(&joined, "/");
    let trimmed = collapsed.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
