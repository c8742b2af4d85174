//! Access request context: who, what, how, and under which circumstances.
//!
//! An [`AccessContext`] is built once per request from whatever upstream
//! authentication and resource-metadata sources exist, and is treated as
//! immutable for the lifetime of the request. Every expression evaluation
//! reads from it; nothing ever writes back.
//!
//! # Example
//! ```
//! use abac_engine_core::access::{AccessContext, Subject, AccessObject, Action, Environment};
//!
//! let context = AccessContext::new(
//!     Subject::new("u-100", "alice")
//!         .roles(&["admin"])
//!         .clearance_level(3),
//!     AccessObject::new("doc-1", "document")
//!         .owner("u-100"),
//!     Action::new("crud", "read"),
//!     Environment::now()
//!         .client_ip("192.168.1.20"),
//! );
//!
//! assert!(context.subject().has_role("admin"));
//! ```

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Local};

/// The entity requesting access.
#[derive(Clone, Debug)]
pub struct Subject {
    id: String,
    name: String,
    roles: HashSet<String>,
    groups: HashSet<String>,
    attributes: HashMap<String, String>,
    clearance_level: i64,
}

impl Subject {
    /// Creates a subject with an id and a display name.
    pub fn new(id: &str, name: &str) -> Self {
        Subject {
            id: id.to_string(),
            name: name.to_string(),
            roles: HashSet::new(),
            groups: HashSet::new(),
            attributes: HashMap::new(),
            clearance_level: 0,
        }
    }

    /// Adds roles (builder pattern).
    pub fn roles(mut self, roles: &[&str]) -> Self {
        for role in roles {
            self.roles.insert((*role).to_string());
        }
        self
    }

    /// Adds groups (builder pattern).
    pub fn groups(mut self, groups: &[&str]) -> Self {
        for group in groups {
            self.groups.insert((*group).to_string());
        }
        self
    }

    /// Adds a free-form attribute (builder pattern).
    pub fn attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    /// Sets the security clearance level (builder pattern).
    pub fn clearance_level(mut self, level: i64) -> Self {
        self.clearance_level = level;
        self
    }

    /// Returns the subject id.
    pub fn get_id(&self) -> &str {
        &self.id
    }

    /// Returns the subject display name.
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Returns the roles.
    pub fn get_roles(&self) -> &HashSet<String> {
        &self.roles
    }

    /// Returns the groups.
    pub fn get_groups(&self) -> &HashSet<String> {
        &self.groups
    }

    /// Returns the free-form attributes.
    pub fn get_attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    /// Returns the clearance level.
    pub fn get_clearance_level(&self) -> i64 {
        self.clearance_level
    }

    /// Checks if the subject has a specific role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Checks if the subject belongs to a specific group.
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.contains(group)
    }
}

/// The resource access is requested for.
#[derive(Clone, Debug)]
pub struct AccessObject {
    id: String,
    object_type: String,
    path: String,
    owner: String,
    tags: HashSet<String>,
    properties: HashMap<String, String>,
    classification_level: i64,
}

impl AccessObject {
    /// Creates an object with an id and a type.
    pub fn new(id: &str, object_type: &str) -> Self {
        AccessObject {
            id: id.to_string(),
            object_type: object_type.to_string(),
            path: String::new(),
            owner: String::new(),
            tags: HashSet::new(),
            properties: HashMap::new(),
            classification_level: 0,
        }
    }

    /// Sets the object path (builder pattern).
    pub fn path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    /// Sets the owning subject id (builder pattern).
    pub fn owner(mut self, owner: &str) -> Self {
        self.owner = owner.to_string();
        self
    }

    /// Adds tags (builder pattern).
    pub fn tags(mut self, tags: &[&str]) -> Self {
        for tag in tags {
            self.tags.insert((*tag).to_string());
        }
        self
    }

    /// Adds a free-form property (builder pattern).
    pub fn property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    /// Sets the classification level (builder pattern).
    pub fn classification_level(mut self, level: i64) -> Self {
        self.classification_level = level;
        self
    }

    /// Returns the object id.
    pub fn get_id(&self) -> &str {
        &self.id
    }

    /// Returns the object type.
    pub fn get_type(&self) -> &str {
        &self.object_type
    }

    /// Returns the object path.
    pub fn get_path(&self) -> &str {
        &self.path
    }

    /// Returns the owning subject id.
    pub fn get_owner(&self) -> &str {
        &self.owner
    }

    /// Returns the tags.
    pub fn get_tags(&self) -> &HashSet<String> {
        &self.tags
    }

    /// Returns the free-form properties.
    pub fn get_properties(&self) -> &HashMap<String, String> {
        &self.properties
    }

    /// Returns the classification level.
    pub fn get_classification_level(&self) -> i64 {
        self.classification_level
    }
}

/// The operation being performed on the object.
#[derive(Clone, Debug)]
pub struct Action {
    action_type: String,
    verb: String,
    parameters: HashMap<String, String>,
}

impl Action {
    /// Creates an action with a type and a verb.
    pub fn new(action_type: &str, verb: &str) -> Self {
        Action {
            action_type: action_type.to_string(),
            verb: verb.to_string(),
            parameters: HashMap::new(),
        }
    }

    /// Adds a parameter (builder pattern).
    pub fn parameter(mut self, key: &str, value: &str) -> Self {
        self.parameters.insert(key.to_string(), value.to_string());
        self
    }

    /// Returns the action type.
    pub fn get_type(&self) -> &str {
        &self.action_type
    }

    /// Returns the action verb.
    pub fn get_verb(&self) -> &str {
        &self.verb
    }

    /// Returns the parameters.
    pub fn get_parameters(&self) -> &HashMap<String, String> {
        &self.parameters
    }

    /// Returns the derived category for the verb.
    ///
    /// read/view/get map to "read", write/update/modify to "write",
    /// delete/remove to "delete"; everything else is "other".
    pub fn category(&self) -> &'static str {
        match self.verb.as_str() {
            "read" | "view" | "get" => "read",
            "write" | "update" | "modify" => "write",
            "delete" | "remove" => "delete",
            _ => "other",
        }
    }
}

/// The circumstances of the request: time, origin, client.
#[derive(Clone, Debug)]
pub struct Environment {
    request_time: DateTime<Local>,
    client_ip: String,
    user_agent: String,
    location: String,
    context_attributes: HashMap<String, String>,
}

impl Environment {
    /// Creates an environment stamped with the current local time.
    pub fn now() -> Self {
        Self::at(Local::now())
    }

    /// Creates an environment with an explicit request time.
    pub fn at(request_time: DateTime<Local>) -> Self {
        Environment {
            request_time,
            client_ip: String::new(),
            user_agent: String::new(),
            location: String::new(),
            context_attributes: HashMap::new(),
        }
    }

    /// Sets the client IP address (builder pattern).
    pub fn client_ip(mut self, ip: &str) -> Self {
        self.client_ip = ip.to_string();
        self
    }

    /// Sets the client user agent (builder pattern).
    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    /// Sets the request location (builder pattern).
    pub fn location(mut self, location: &str) -> Self {
        self.location = location.to_string();
        self
    }

    /// Adds a free-form context attribute (builder pattern).
    pub fn attribute(mut self, key: &str, value: &str) -> Self {
        self.context_attributes
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Returns the request time.
    pub fn get_request_time(&self) -> DateTime<Local> {
        self.request_time
    }

    /// Returns the client IP address.
    pub fn get_client_ip(&self) -> &str {
        &self.client_ip
    }

    /// Returns the client user agent.
    pub fn get_user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Returns the request location.
    pub fn get_location(&self) -> &str {
        &self.location
    }

    /// Returns the free-form context attributes.
    pub fn get_context_attributes(&self) -> &HashMap<String, String> {
        &self.context_attributes
    }
}

/// The full attribute set for one access request.
///
/// Immutable once constructed; evaluation is a pure function of this value
/// and the parsed policy trees.
#[derive(Clone, Debug)]
pub struct AccessContext {
    subject: Subject,
    object: AccessObject,
    action: Action,
    environment: Environment,
}

impl AccessContext {
    /// Assembles a context from its four attribute categories.
    pub fn new(
        subject: Subject,
        object: AccessObject,
        action: Action,
        environment: Environment,
    ) -> Self {
        AccessContext {
            subject,
            object,
            action,
            environment,
        }
    }

    /// Returns the subject attributes.
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// Returns the object attributes.
    pub fn object(&self) -> &AccessObject {
        &self.object
    }

    /// Returns the action attributes.
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Returns the environment attributes.
    pub fn environment(&self) -> &Environment {
        &self.environment
    }
}
