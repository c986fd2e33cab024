//! The identity subgraph of a mirrored user.
//!
//! A user is represented by a node joined to a link holding the username:
//!
//! ```text
//!   ui_user ──access──▶ _user ──common──▶ _link "alice"
//!                                  ▲
//!   nrel_login ───────access───────┘   (targets the common edge)
//! ```
//!
//! The builders here are pure: given the username and the resolved keynode
//! addresses they always produce the same template or spec.

use crate::graph::{ElementType, GraphAddr};

use super::{CreationSpec, Template, TemplateError, TemplateItem};

pub const USER_ALIAS: &str = "_user";
pub const USER_EDGE_ALIAS: &str = "_user_edge";
pub const LINK_ALIAS: &str = "_link";
pub const LINK_EDGE_ALIAS: &str = "_link_edge";
pub const LOGIN_EDGE_ALIAS: &str = "_login_edge";

/// Keynode addresses anchoring every identity subgraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityKeynodes {
    /// The "has login" relation marking the user→link edge.
    pub login_relation: GraphAddr,
    /// The class of user-interface users, marking the user node.
    pub ui_user: GraphAddr,
}

/// Template matching the identity subgraph anchored at a login link.
pub fn user_lookup_template(
    keynodes: &IdentityKeynodes,
    link: GraphAddr,
) -> Result<Template, TemplateError> {
    Template::builder()
        .triple(
            TemplateItem::addr(keynodes.ui_user),
            TemplateItem::typed(ElementType::EdgeAccessVarPosPerm, USER_EDGE_ALIAS),
            TemplateItem::typed(ElementType::NodeVar, USER_ALIAS),
        )?
        .triple(
            TemplateItem::alias(USER_ALIAS),
            TemplateItem::typed(ElementType::EdgeDCommonVar, LINK_EDGE_ALIAS),
            TemplateItem::addr_as(link, LINK_ALIAS),
        )?
        .triple(
            TemplateItem::addr(keynodes.login_relation),
            TemplateItem::typed(ElementType::EdgeAccessVarPosPerm, LOGIN_EDGE_ALIAS),
            TemplateItem::alias(LINK_EDGE_ALIAS),
        )?
        .build()
}

/// Creation spec for a brand-new identity subgraph.
///
/// Instructions, in order: the login link, the user node, the user→link
/// edge, the login-relation access edge onto that edge, and the ui-user
/// access edge onto the node.
pub fn user_creation_spec(
    keynodes: &IdentityKeynodes,
    username: &str,
) -> Result<CreationSpec, TemplateError> {
    let mut spec = CreationSpec::new();
    let link = spec.link(ElementType::LinkConst, username);
    let user = spec.node(ElementType::NodeConst);
    let login = spec.edge(ElementType::EdgeDCommonConst, user, link)?;
    spec.edge(
        ElementType::EdgeAccessConstPosPerm,
        keynodes.login_relation,
        login,
    )?;
    spec.edge(ElementType::EdgeAccessConstPosPerm, keynodes.ui_user, user)?;
    Ok(spec)
}
