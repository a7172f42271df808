//! Repo-local architectural lint for the discovery backend.
//!
//! The backend is split into `domain` (entities, ports, services), inbound
//! adapters (HTTP), and outbound adapters (Postgres, Redis, credentials).
//! This crate provides a lightweight lint that:
//!
//! - forbids `domain` code from depending on adapter modules (`inbound`,
//!   `outbound`) or framework/infrastructure crates
//! - forbids `inbound` adapters from importing `outbound` modules or
//!   infrastructure crates directly
//! - forbids `outbound` adapters from importing `inbound` modules
//! - forbids `domain` functions from looking up an owned resource
//!   (`get_by_id`, `get_by_natural_key` on the project or molecule
//!   repositories) without calling `check_ownership` or `require_admin` in
//!   the same function body
//!
//! Run it with `cargo run -p architecture-lint` from anywhere in the
//! workspace.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use syn::visit::Visit;

/// Library name of the linted crate, as it appears in absolute paths.
const CRATE_NAME: &str = "discovery_backend";

/// Repository lookups that return an owned resource.
const OWNED_LOOKUPS: [&str; 2] = ["get_by_id", "get_by_natural_key"];

/// Receivers holding repositories of owned resources.
const OWNED_REPOSITORIES: [&str; 2] = ["projects", "molecules"];

/// Calls that satisfy the ownership rule.
const OWNERSHIP_GUARDS: [&str; 2] = ["check_ownership", "require_admin"];

/// A single boundary violation discovered by the linter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File path relative to `backend/src`.
    pub file: PathBuf,
    /// Human-readable description of the violated rule.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.message)
    }
}

/// Failure modes returned by the architecture lint.
#[derive(Debug)]
pub enum ArchitectureLintError {
    /// Filesystem traversal or reading failed.
    Io(io::Error),
    /// Rust source parsing failed.
    Parse { file: PathBuf, message: String },
    /// One or more boundary violations were found.
    Violations(Vec<Violation>),
}

impl fmt::Display for ArchitectureLintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error while linting architecture: {err}"),
            Self::Parse { file, message } => write!(
                f,
                "Failed to parse Rust source while linting architecture ({}): {message}",
                file.display()
            ),
            Self::Violations(violations) => {
                writeln!(f, "Architecture boundary violations:")?;
                for violation in violations {
                    writeln!(f, "- {violation}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ArchitectureLintError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ArchitectureLintError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Lint the backend crate sources on disk.
///
/// `backend_dir` must be the `backend/` directory at the repository root.
pub fn lint_backend_sources(backend_dir: &Path) -> Result<(), ArchitectureLintError> {
    let src_dir = backend_dir.join("src");
    let sources = collect_lint_sources(&src_dir)?;
    lint_sources(&sources)
}

/// Lint the provided Rust sources. Intended for unit and behaviour tests.
pub fn lint_sources(sources: &[LintSource]) -> Result<(), ArchitectureLintError> {
    let mut violations = Vec::new();

    for source in sources {
        let layer = ModuleLayer::infer_from_path(&source.file).ok_or_else(|| {
            ArchitectureLintError::Parse {
                file: source.file.clone(),
                message: "unable to infer module layer from file path".to_owned(),
            }
        })?;
        let parsed =
            syn::parse_file(&source.contents).map_err(|err| ArchitectureLintError::Parse {
                file: source.file.clone(),
                message: err.to_string(),
            })?;
        violations.extend(lint_parsed_source(&source.file, layer, &parsed));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ArchitectureLintError::Violations(violations))
    }
}

/// A Rust source file to be linted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSource {
    /// Path relative to `backend/src`.
    pub file: PathBuf,
    pub contents: String,
}

/// The architectural "layer" inferred from a file path under `backend/src`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModuleLayer {
    Domain,
    Inbound,
    Outbound,
}

impl ModuleLayer {
    fn infer_from_path(relative_path: &Path) -> Option<Self> {
        let first = relative_path
            .components()
            .next()?
            .as_os_str()
            .to_string_lossy();
        match first.as_ref() {
            "domain" => Some(Self::Domain),
            "inbound" => Some(Self::Inbound),
            "outbound" => Some(Self::Outbound),
            _ => None,
        }
    }

    fn forbidden_module_roots(self) -> BTreeSet<&'static str> {
        match self {
            Self::Domain => BTreeSet::from(["inbound", "outbound"]),
            Self::Inbound => BTreeSet::from(["outbound"]),
            Self::Outbound => BTreeSet::from(["inbound"]),
        }
    }

    fn forbidden_crate_roots(self) -> BTreeSet<&'static str> {
        match self {
            Self::Domain => BTreeSet::from([
                "actix",
                "actix_service",
                "actix_web",
                "argon2",
                "bb8",
                "bb8_redis",
                "diesel",
                "diesel_async",
                "diesel_migrations",
                "jsonwebtoken",
                "redis",
            ]),
            Self::Inbound => BTreeSet::from([
                "argon2",
                "bb8",
                "bb8_redis",
                "diesel",
                "diesel_async",
                "diesel_migrations",
                "jsonwebtoken",
                "redis",
            ]),
            Self::Outbound => BTreeSet::from(["actix", "actix_service", "actix_web"]),
        }
    }
}

fn lint_parsed_source(file: &Path, layer: ModuleLayer, parsed: &syn::File) -> Vec<Violation> {
    let forbidden_modules = layer.forbidden_module_roots();
    let forbidden_crates = layer.forbidden_crate_roots();
    let layer_name = layer_name(layer);

    let mut collector = PathCollector::default();
    collector.visit_file(parsed);

    let mut messages = BTreeSet::new();
    for segments in &collector.paths {
        if let Some(root) = forbidden_internal_module_root(segments, &forbidden_modules) {
            messages.insert(format!(
                "{layer_name} module must not depend on crate::{root}"
            ));
        }

        if let Some(root) = forbidden_external_crate_root(segments, &forbidden_crates) {
            messages.insert(format!(
                "{layer_name} module must not depend on external crate `{root}`"
            ));
        }
    }

    if layer == ModuleLayer::Domain {
        let mut guard = OwnershipGuardCollector::default();
        guard.visit_file(parsed);
        for function in guard.unguarded {
            messages.insert(format!(
                "domain function `{function}` looks up an owned resource without check_ownership or require_admin"
            ));
        }
    }

    messages
        .into_iter()
        .map(|message| Violation {
            file: file.to_path_buf(),
            message,
        })
        .collect()
}

const fn layer_name(layer: ModuleLayer) -> &'static str {
    match layer {
        ModuleLayer::Domain => "domain",
        ModuleLayer::Inbound => "inbound",
        ModuleLayer::Outbound => "outbound",
    }
}

fn forbidden_internal_module_root(
    segments: &[String],
    forbidden_roots: &BTreeSet<&'static str>,
) -> Option<&'static str> {
    let root = internal_module_root(segments)?;
    forbidden_roots.get(root).copied()
}

fn forbidden_external_crate_root(
    segments: &[String],
    forbidden_roots: &BTreeSet<&'static str>,
) -> Option<&'static str> {
    let root = external_crate_root(segments)?;
    forbidden_roots.get(root).copied()
}

fn is_relative_module_segment(segment: &str) -> bool {
    matches!(segment, "crate" | "self" | "super")
}

fn internal_module_root(segments: &[String]) -> Option<&str> {
    let first = segments.first()?.as_str();
    if matches!(first, "domain" | "inbound" | "outbound") {
        return Some(first);
    }
    let start_index = match first {
        "crate" | "self" | "super" => segments
            .iter()
            .position(|segment| !is_relative_module_segment(segment.as_str()))?,
        CRATE_NAME => 1,
        _ => return None,
    };
    segments.get(start_index).map(|segment| segment.as_str())
}

fn external_crate_root(segments: &[String]) -> Option<&str> {
    let root = segments.first()?.as_str();
    if is_relative_module_segment(root) || root == CRATE_NAME {
        return None;
    }
    Some(root)
}

#[derive(Default)]
struct PathCollector {
    paths: BTreeSet<Vec<String>>,
}

impl PathCollector {
    fn record_path(&mut self, path: &syn::Path) {
        let segments = path
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect::<Vec<_>>();
        if segments.is_empty() {
            return;
        }
        self.paths.insert(segments);
    }

    fn record_use_tree(&mut self, tree: &syn::UseTree, prefix: Vec<String>) {
        match tree {
            syn::UseTree::Path(path) => {
                let mut next = prefix;
                next.push(path.ident.to_string());
                self.record_use_tree(&path.tree, next);
            }
            syn::UseTree::Name(name) => {
                let mut segments = prefix;
                segments.push(name.ident.to_string());
                self.paths.insert(segments);
            }
            syn::UseTree::Rename(rename) => {
                let mut segments = prefix;
                segments.push(rename.ident.to_string());
                self.paths.insert(segments);
            }
            syn::UseTree::Glob(_) => {
                let mut segments = prefix;
                segments.push("*".to_owned());
                self.paths.insert(segments);
            }
            syn::UseTree::Group(group) => {
                for item in &group.items {
                    self.record_use_tree(item, prefix.clone());
                }
            }
        }
    }
}

impl<'ast> Visit<'ast> for PathCollector {
    fn visit_path(&mut self, node: &'ast syn::Path) {
        self.record_path(node);
        syn::visit::visit_path(self, node);
    }

    fn visit_item_use(&mut self, node: &'ast syn::ItemUse) {
        self.record_use_tree(&node.tree, Vec::new());
    }
}

/// Finds functions that perform an owned lookup but never guard it.
#[derive(Default)]
struct OwnershipGuardCollector {
    unguarded: Vec<String>,
}

impl OwnershipGuardCollector {
    fn inspect(&mut self, name: &syn::Ident, body: &syn::Block) {
        let mut calls = FunctionCalls::default();
        calls.visit_block(body);
        if calls.owned_lookup && !calls.guarded {
            self.unguarded.push(name.to_string());
        }
    }
}

impl<'ast> Visit<'ast> for OwnershipGuardCollector {
    fn visit_item_fn(&mut self, node: &'ast syn::ItemFn) {
        self.inspect(&node.sig.ident, &node.block);
        syn::visit::visit_item_fn(self, node);
    }

    fn visit_impl_item_fn(&mut self, node: &'ast syn::ImplItemFn) {
        self.inspect(&node.sig.ident, &node.block);
        syn::visit::visit_impl_item_fn(self, node);
    }
}

/// Calls made directly in one function body. Nested functions are skipped;
/// the outer collector inspects them on their own.
#[derive(Default)]
struct FunctionCalls {
    owned_lookup: bool,
    guarded: bool,
}

impl<'ast> Visit<'ast> for FunctionCalls {
    fn visit_item_fn(&mut self, _node: &'ast syn::ItemFn) {}

    fn visit_expr_method_call(&mut self, node: &'ast syn::ExprMethodCall) {
        let method = node.method.to_string();
        if OWNED_LOOKUPS.contains(&method.as_str())
            && receiver_name(&node.receiver).is_some_and(|name| OWNED_REPOSITORIES.contains(&name.as_str()))
        {
            self.owned_lookup = true;
        }
        if OWNERSHIP_GUARDS.contains(&method.as_str()) {
            self.guarded = true;
        }
        syn::visit::visit_expr_method_call(self, node);
    }

    fn visit_expr_call(&mut self, node: &'ast syn::ExprCall) {
        if let syn::Expr::Path(path) = node.func.as_ref() {
            let called = path.path.segments.last().map(|segment| segment.ident.to_string());
            if called.is_some_and(|name| OWNERSHIP_GUARDS.contains(&name.as_str())) {
                self.guarded = true;
            }
        }
        syn::visit::visit_expr_call(self, node);
    }
}

/// Name of the field or binding a method is called on, looking through
/// borrows, parentheses, and `as_ref()`.
fn receiver_name(expr: &syn::Expr) -> Option<String> {
    match expr {
        syn::Expr::Field(field) => match &field.member {
            syn::Member::Named(ident) => Some(ident.to_string()),
            syn::Member::Unnamed(_) => None,
        },
        syn::Expr::Path(path) => path.path.get_ident().map(ToString::to_string),
        syn::Expr::Paren(inner) => receiver_name(&inner.expr),
        syn::Expr::Reference(inner) => receiver_name(&inner.expr),
        syn::Expr::MethodCall(call) if call.method == "as_ref" => receiver_name(&call.receiver),
        _ => None,
    }
}

fn collect_lint_sources(src_dir: &Path) -> Result<Vec<LintSource>, ArchitectureLintError> {
    let mut sources = Vec::new();
    for layer_dir in ["domain", "inbound", "outbound"] {
        let dir = src_dir.join(layer_dir);
        if !dir.exists() {
            continue;
        }
        collect_sources_under(src_dir, &dir, &mut sources)?;
    }
    Ok(sources)
}

fn collect_sources_under(
    src_root: &Path,
    current: &Path,
    sources: &mut Vec<LintSource>,
) -> Result<(), ArchitectureLintError> {
    for entry in fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_sources_under(src_root, &path, sources)?;
            continue;
        }

        if path.extension().and_then(|ext| ext.to_str()) != Some("rs") {
            continue;
        }

        let relative = path
            .strip_prefix(src_root)
            .map_err(|err| ArchitectureLintError::Parse {
                file: path.clone(),
                message: err.to_string(),
            })?
            .to_path_buf();
        let contents = fs::read_to_string(&path)?;
        sources.push(LintSource {
            file: relative,
            contents,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests;
