//! Enterprise SAML external-identity query and page decoding.

use crate::ext::serde_json::JsonFetch;
use crate::model::DirectoryEntry;

pub const SAML_PAGE_SIZE: u32 = 100;

pub const SAML_IDENTITIES_QUERY: &str = r#"
query($enterprise: String!, $first: Int!, $after: String) {
  enterprise(slug: $enterprise) {
    ownerInfo {
      samlIdentityProvider {
        externalIdentities(after: $after, first: $first) {
          pageInfo {
            hasNextPage
            endCursor
          }
          edges {
            node {
              samlIdentity {
                nameId
              }
              user {
                login
              }
            }
          }
        }
      }
    }
  }
}
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamlPage {
  /// The enterprise has no SAML identity provider configured (or is not visible to the token).
  NoProvider,
  Entries {
    entries: Vec<DirectoryEntry>,
    next_cursor: Option<String>,
  },
}

/// Decode the GraphQL `data` object of one identities page.
pub fn parse_page(data: &serde_json::Value) -> SamlPage {
  let identities = data.fetch("enterprise.ownerInfo.samlIdentityProvider.externalIdentities");
  let Some(identities) = identities.value() else {
    return SamlPage::NoProvider;
  };

  let edges = identities.fetch("edges").value().and_then(|v| v.as_array());
  let entries = edges
    .into_iter()
    .flatten()
    .filter_map(|edge| {
      // identities not yet linked to a platform account have a null user
      let login = edge.fetch("node.user.login").to_non_empty_string()?;
      let sso_email = edge.fetch("node.samlIdentity.nameId").to_non_empty_string()?;
      Some(DirectoryEntry { login, sso_email })
    })
    .collect();

  let has_next = identities.fetch("pageInfo.hasNextPage").to::<bool>().unwrap_or(false);
  let next_cursor = if has_next {
    identities.fetch("pageInfo.endCursor").to_non_empty_string()
  } else {
    None
  };

  SamlPage::Entries { entries, next_cursor }
}
