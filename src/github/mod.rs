// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Namespace for the GitHub platform client (trait seam, HTTP backend, pagination, SAML decoding)
// role: github/namespace
// outputs: Public submodules; the in-memory backend only under cfg(test)
// invariants: No ambient client singletons; callers construct and pass a backend explicitly
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod api;
pub mod http;
pub mod links;
pub mod saml;
pub mod token;
