//! Unit tests for the architecture lint.

use std::path::PathBuf;

use rstest::fixture;
use rstest::rstest;

use super::*;

#[derive(Clone, Copy)]
struct LintSingle;

impl LintSingle {
    fn lint(self, file: &str, contents: &str) -> Result<(), ArchitectureLintError> {
        lint_sources(&[LintSource {
            file: PathBuf::from(file),
            contents: contents.to_owned(),
        }])
    }
}

#[fixture]
fn lint_single() -> LintSingle {
    LintSingle
}

fn messages(result: Result<(), ArchitectureLintError>) -> Vec<String> {
    match result {
        Ok(()) => Vec::new(),
        Err(ArchitectureLintError::Violations(violations)) => {
            violations.into_iter().map(|v| v.message).collect()
        }
        Err(other) => panic!("unexpected lint failure: {other}"),
    }
}

#[rstest]
#[case(
    "inbound/http/projects.rs",
    "use crate::domain::ProjectId; fn handler() { let _ = ProjectId::random(); }",
    true
)]
#[case(
    "inbound/http/projects.rs",
    "use crate::outbound::persistence::DieselProjectRepository; fn handler() { let _ = DieselProjectRepository; }",
    false
)]
#[case(
    "inbound/http/projects.rs",
    "use outbound::persistence::DieselProjectRepository; fn handler() { let _ = DieselProjectRepository; }",
    false
)]
#[case(
    "inbound/http/projects.rs",
    "use discovery_backend::outbound::persistence::DieselProjectRepository; fn handler() { let _ = DieselProjectRepository; }",
    false
)]
#[case("inbound/http/projects.rs", "use diesel::prelude::*; fn handler() {}", false)]
#[case(
    "inbound/http/auth.rs",
    "use jsonwebtoken::decode; fn handler() { let _ = decode::<()>; }",
    false
)]
#[case(
    "domain/project.rs",
    "use crate::inbound::http; fn thing() { let _ = 1; }",
    false
)]
#[case(
    "domain/rate_limit.rs",
    "use bb8_redis::RedisConnectionManager; fn thing() {}",
    false
)]
#[case(
    "domain/account_service.rs",
    "use argon2::Argon2; fn thing() {}",
    false
)]
#[case(
    "outbound/persistence/diesel_project_repository.rs",
    "use crate::inbound::http; fn thing() { let _ = 1; }",
    false
)]
#[case(
    "outbound/persistence/diesel_project_repository.rs",
    "use inbound::http; fn thing() { let _ = 1; }",
    false
)]
#[case(
    "outbound/rate_limit/mod.rs",
    "use bb8_redis::RedisConnectionManager; use crate::domain::ports::RateLimitStore; fn thing() {}",
    true
)]
#[case(
    "domain/project.rs",
    "use utoipa::ToSchema; #[derive(ToSchema)] struct Foo;",
    true
)]
fn detects_boundary_violations(
    lint_single: LintSingle,
    #[case] file: &str,
    #[case] contents: &str,
    #[case] ok: bool,
) {
    let result = lint_single.lint(file, contents);
    assert_eq!(result.is_ok(), ok, "result: {result:?}");
}

#[rstest]
#[case::guarded_lookup(
    "impl S { async fn load(&self, actor: &Actor, id: &ProjectId) -> R { let p = self.projects.get_by_id(id).await?; check_ownership(&p, actor)?; Ok(p) } }",
    true
)]
#[case::admin_lookup(
    "impl S { async fn load(&self, actor: &Actor, id: &MoleculeId) -> R { require_admin(actor)?; self.molecules.get_by_id(id).await } }",
    true
)]
#[case::qualified_guard(
    "fn load(projects: &P, actor: &Actor) -> R { let p = projects.get_by_id(&ID)?; authorization::check_ownership(&p, actor)?; Ok(p) }",
    true
)]
#[case::user_lookup(
    "impl S { async fn load(&self, id: &UserId) -> R { self.users.get_by_id(id).await } }",
    true
)]
#[case::unguarded_lookup(
    "impl S { async fn load(&self, id: &ProjectId) -> R { self.projects.get_by_id(id).await } }",
    false
)]
#[case::unguarded_natural_key(
    "impl S { async fn find(&self, owner: &UserId, s: &Smiles) -> R { self.molecules.as_ref().get_by_natural_key(owner, s).await } }",
    false
)]
#[case::guard_in_sibling_only(
    "impl S { async fn load(&self, id: &ProjectId) -> R { self.projects.get_by_id(id).await } fn check(&self, p: &Project, a: &Actor) -> R { check_ownership(p, a) } }",
    false
)]
fn owned_lookups_require_a_guard(
    lint_single: LintSingle,
    #[case] contents: &str,
    #[case] ok: bool,
) {
    let result = lint_single.lint("domain/project_service.rs", contents);
    assert_eq!(result.is_ok(), ok, "result: {result:?}");
}

#[rstest]
fn ownership_violations_name_the_function(lint_single: LintSingle) {
    let found = messages(lint_single.lint(
        "domain/molecule_service.rs",
        "impl S { async fn fetch_any(&self, id: &MoleculeId) -> R { self.molecules.get_by_id(id).await } }",
    ));
    assert_eq!(found.len(), 1);
    assert!(found.iter().all(|m| m.contains("`fetch_any`")), "{found:?}");
}

#[rstest]
fn ownership_rule_is_limited_to_the_domain(lint_single: LintSingle) {
    let result = lint_single.lint(
        "outbound/persistence/diesel_project_repository.rs",
        "impl S { async fn reload(&self, id: &ProjectId) -> R { self.projects.get_by_id(id).await } }",
    );
    assert!(result.is_ok(), "result: {result:?}");
}

#[rstest]
fn unknown_layers_are_reported(lint_single: LintSingle) {
    let result = lint_single.lint("server/mod.rs", "fn main() {}");
    assert!(matches!(result, Err(ArchitectureLintError::Parse { .. })));
}
