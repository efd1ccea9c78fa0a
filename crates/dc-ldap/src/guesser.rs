//! Directory structure guessing.
//!
//! One guesser per server flavor, all behind [`ServerGuesser`]. Guessing is
//! advisory: [`guess_structure`] logs and absorbs every probe failure and
//! returns whatever it could infer.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{presence_filter, ServerFlavor};
use crate::directory::{DirectorySession, SearchRequest};
use crate::error::{LdapError, LdapResult};
use crate::search::collect_entries;

/// Filter used for root DSE reads.
pub const ROOT_DSE_FILTER: &str = "(objectClass=*)";

const NAMING_CONTEXTS: &str = "namingContexts";
const DEFAULT_NAMING_CONTEXT: &str = "defaultNamingContext";

/// Attribute list that requests no attributes.
const NO_ATTRIBUTES: &str = "1.1";

/// What a directory-structure probe inferred.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessedStructure {
    /// Candidate base DNs for users.
    pub base_user_dn: Vec<String>,
    /// Candidate base DNs for groups.
    pub base_group_dn: Vec<String>,
    /// Inferred user naming attribute.
    pub user_name_attribute: String,
    /// Inferred group object class.
    pub group_object_class: String,
    /// Inferred membership attribute.
    pub membership_attribute: String,
    /// Candidate search bases (naming contexts).
    pub base_contexts: Vec<String>,
}

/// Vendor-specific structure inference.
#[async_trait]
pub trait ServerGuesser: Send + Sync {
    /// The flavor this guesser handles.
    fn flavor(&self) -> ServerFlavor;

    /// Filter matching containers that usually hold users.
    fn user_base_filter(&self) -> &'static str;

    /// Filter matching containers that usually hold groups.
    fn group_base_filter(&self) -> &'static str;

    /// Attributes user entries of this flavor usually carry.
    fn standard_user_attributes(&self) -> &'static [&'static str];

    /// Default naming attribute.
    fn user_name_attribute(&self) -> &'static str {
        self.flavor().user_name_attribute()
    }

    /// Default group object class.
    fn group_object_class(&self) -> &'static str {
        self.flavor().group_object_class()
    }

    /// Default membership attribute.
    fn membership_attribute(&self) -> &'static str {
        self.flavor().membership_attribute()
    }

    /// Root DSE naming contexts, sorted and deduplicated.
    async fn base_contexts(&self, session: &mut dyn DirectorySession) -> LdapResult<Vec<String>> {
        let root = read_root_dse(session).await?;
        Ok(sorted(root.naming_contexts))
    }

    /// Candidate user base DNs under `contexts`.
    async fn user_base_choices(
        &self,
        session: &mut dyn DirectorySession,
        contexts: &[String],
    ) -> LdapResult<Vec<String>> {
        find_containers(session, contexts, self.user_base_filter()).await
    }

    /// Candidate group base DNs under `contexts`.
    async fn group_base_choices(
        &self,
        session: &mut dyn DirectorySession,
        contexts: &[String],
    ) -> LdapResult<Vec<String>> {
        find_containers(session, contexts, self.group_base_filter()).await
    }

    /// Attribute names a claim could be mapped to.
    ///
    /// Reads the first member of the first group under `base_group_dn` that
    /// has `membership_attribute`, and adds the flavor's standard attributes.
    async fn claim_attribute_options(
        &self,
        session: &mut dyn DirectorySession,
        base_group_dn: &str,
        membership_attribute: &str,
    ) -> LdapResult<BTreeSet<String>> {
        let mut options: BTreeSet<String> = self
            .standard_user_attributes()
            .iter()
            .map(|a| (*a).to_string())
            .collect();

        let groups = collect_entries(
            session,
            &SearchRequest::subtree(base_group_dn, presence_filter(membership_attribute)?)
                .with_attributes([membership_attribute]),
        )
        .await?;

        let member = groups
            .iter()
            .find_map(|group| group.get_attr(membership_attribute))
            .map(str::to_string);

        if let Some(member) = member {
            let users =
                collect_entries(session, &SearchRequest::base_object(member.as_str(), ROOT_DSE_FILTER)).await?;
            if let Some(user) = users.first() {
                options.extend(user.attributes.keys().cloned());
            }
        } else {
            tracing::debug!(base = base_group_dn, "No group with members found");
        }

        Ok(options)
    }
}

/// Generic RFC 4510 directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericGuesser;

#[async_trait]
impl ServerGuesser for GenericGuesser {
    fn flavor(&self) -> ServerFlavor {
        ServerFlavor::Generic
    }

    fn user_base_filter(&self) -> &'static str {
        "(&(|(objectClass=organizationalUnit)(objectClass=container))(|(ou=*user*)(ou=*people*)(cn=*user*)(cn=*people*)))"
    }

    fn group_base_filter(&self) -> &'static str {
        "(&(|(objectClass=organizationalUnit)(objectClass=container))(|(ou=*group*)(cn=*group*)))"
    }

    fn standard_user_attributes(&self) -> &'static [&'static str] {
        &["cn", "sn", "givenName", "mail", "uid", "telephoneNumber"]
    }
}

/// Microsoft Active Directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveDirectoryGuesser;

#[async_trait]
impl ServerGuesser for ActiveDirectoryGuesser {
    fn flavor(&self) -> ServerFlavor {
        ServerFlavor::ActiveDirectory
    }

    fn user_base_filter(&self) -> &'static str {
        "(|(&(objectClass=container)(cn=Users))(&(objectClass=organizationalUnit)(|(ou=*user*)(ou=*people*))))"
    }

    fn group_base_filter(&self) -> &'static str {
        "(|(&(objectClass=container)(cn=Users))(&(objectClass=organizationalUnit)(ou=*group*)))"
    }

    fn standard_user_attributes(&self) -> &'static [&'static str] {
        &[
            "cn",
            "sn",
            "givenName",
            "mail",
            "displayName",
            "sAMAccountName",
            "userPrincipalName",
            "telephoneNumber",
        ]
    }

    /// The default naming context when published, otherwise the naming
    /// contexts minus the configuration, schema and DNS partitions.
    async fn base_contexts(&self, session: &mut dyn DirectorySession) -> LdapResult<Vec<String>> {
        let root = read_root_dse(session).await?;
        if let Some(default) = root.default_naming_context {
            return Ok(vec![default]);
        }
        Ok(sorted(
            root.naming_contexts
                .into_iter()
                .filter(|dn| !is_ad_system_partition(dn)),
        ))
    }
}

fn is_ad_system_partition(dn: &str) -> bool {
    let lower = dn.to_ascii_lowercase();
    ["cn=configuration,", "cn=schema,", "dc=domaindnszones,", "dc=forestdnszones,"]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

/// OpenLDAP.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenLdapGuesser;

#[async_trait]
impl ServerGuesser for OpenLdapGuesser {
    fn flavor(&self) -> ServerFlavor {
        ServerFlavor::OpenLdap
    }

    fn user_base_filter(&self) -> &'static str {
        "(&(objectClass=organizationalUnit)(|(ou=people)(ou=users)(ou=*user*)))"
    }

    fn group_base_filter(&self) -> &'static str {
        "(&(objectClass=organizationalUnit)(|(ou=groups)(ou=*group*)))"
    }

    fn standard_user_attributes(&self) -> &'static [&'static str] {
        &["cn", "sn", "givenName", "mail", "uid", "telephoneNumber", "employeeNumber"]
    }
}

/// The directory bundled with the host platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedGuesser;

impl EmbeddedGuesser {
    /// Well-known user container, relative to a naming context.
    pub const USERS_RDN: &'static str = "ou=users";
    /// Well-known group container, relative to a naming context.
    pub const GROUPS_RDN: &'static str = "ou=groups";
}

#[async_trait]
impl ServerGuesser for EmbeddedGuesser {
    fn flavor(&self) -> ServerFlavor {
        ServerFlavor::Embedded
    }

    fn user_base_filter(&self) -> &'static str {
        OpenLdapGuesser.user_base_filter()
    }

    fn group_base_filter(&self) -> &'static str {
        OpenLdapGuesser.group_base_filter()
    }

    fn standard_user_attributes(&self) -> &'static [&'static str] {
        &["cn", "sn", "givenName", "mail", "uid", "telephoneNumber"]
    }

    async fn user_base_choices(
        &self,
        session: &mut dyn DirectorySession,
        contexts: &[String],
    ) -> LdapResult<Vec<String>> {
        let mut choices = find_containers(session, contexts, self.user_base_filter()).await?;
        choices.extend(well_known(session, contexts, Self::USERS_RDN).await);
        Ok(sorted(choices))
    }

    async fn group_base_choices(
        &self,
        session: &mut dyn DirectorySession,
        contexts: &[String],
    ) -> LdapResult<Vec<String>> {
        let mut choices = find_containers(session, contexts, self.group_base_filter()).await?;
        choices.extend(well_known(session, contexts, Self::GROUPS_RDN).await);
        Ok(sorted(choices))
    }
}

/// Returns the guesser for `flavor`.
#[must_use]
pub fn guesser_for(flavor: ServerFlavor) -> Box<dyn ServerGuesser> {
    match flavor {
        ServerFlavor::Generic => Box::new(GenericGuesser),
        ServerFlavor::ActiveDirectory => Box::new(ActiveDirectoryGuesser),
        ServerFlavor::OpenLdap => Box::new(OpenLdapGuesser),
        ServerFlavor::Embedded => Box::new(EmbeddedGuesser),
    }
}

/// Runs every structure probe for `flavor`, absorbing failures.
pub async fn guess_structure(flavor: ServerFlavor, session: &mut dyn DirectorySession) -> GuessedStructure {
    let guesser = guesser_for(flavor);

    let base_contexts = absorb("base contexts", guesser.base_contexts(session).await);
    let base_user_dn = absorb(
        "user base choices",
        guesser.user_base_choices(session, &base_contexts).await,
    );
    let base_group_dn = absorb(
        "group base choices",
        guesser.group_base_choices(session, &base_contexts).await,
    );

    GuessedStructure {
        base_user_dn,
        base_group_dn,
        user_name_attribute: guesser.user_name_attribute().to_string(),
        group_object_class: guesser.group_object_class().to_string(),
        membership_attribute: guesser.membership_attribute().to_string(),
        base_contexts,
    }
}

fn absorb(probe: &str, result: LdapResult<Vec<String>>) -> Vec<String> {
    result.unwrap_or_else(|e| {
        tracing::warn!(probe, error = %e, "Directory introspection failed");
        Vec::new()
    })
}

struct RootDse {
    naming_contexts: Vec<String>,
    default_naming_context: Option<String>,
}

async fn read_root_dse(session: &mut dyn DirectorySession) -> LdapResult<RootDse> {
    let request = SearchRequest::base_object("", ROOT_DSE_FILTER)
        .with_attributes([NAMING_CONTEXTS, DEFAULT_NAMING_CONTEXT]);
    let entries = collect_entries(session, &request).await?;
    let root = entries
        .into_iter()
        .next()
        .ok_or_else(|| LdapError::search("root DSE not readable"))?;

    Ok(RootDse {
        naming_contexts: root.get_attrs(NAMING_CONTEXTS).to_vec(),
        default_naming_context: root
            .get_attr(DEFAULT_NAMING_CONTEXT)
            .filter(|dn| !dn.is_empty())
            .map(str::to_string),
    })
}

/// Searches each context for `filter`. Falls back to the contexts themselves
/// when nothing matches.
async fn find_containers(
    session: &mut dyn DirectorySession,
    contexts: &[String],
    filter: &str,
) -> LdapResult<Vec<String>> {
    let mut found = Vec::new();
    for context in contexts {
        let request = SearchRequest::subtree(context.as_str(), filter).with_attributes([NO_ATTRIBUTES]);
        match collect_entries(session, &request).await {
            Ok(entries) => found.extend(entries.into_iter().map(|e| e.dn)),
            Err(e) => tracing::warn!(base = %context, filter, error = %e, "Container search failed"),
        }
    }

    if found.is_empty() {
        return Ok(sorted(contexts.iter().cloned()));
    }
    Ok(sorted(found))
}

/// Returns `<rdn>,<context>` for every context where that entry exists.
async fn well_known(session: &mut dyn DirectorySession, contexts: &[String], rdn: &str) -> Vec<String> {
    let mut found = Vec::new();
    for context in contexts {
        let dn = format!("{rdn},{context}");
        let request = SearchRequest::base_object(dn.as_str(), ROOT_DSE_FILTER).with_attributes([NO_ATTRIBUTES]);
        match collect_entries(session, &request).await {
            Ok(entries) if !entries.is_empty() => found.push(dn),
            Ok(_) => {}
            Err(e) => tracing::debug!(base = %dn, error = %e, "Well-known container not readable"),
        }
    }
    found
}

fn sorted(dns: impl IntoIterator<Item = String>) -> Vec<String> {
    dns.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}
