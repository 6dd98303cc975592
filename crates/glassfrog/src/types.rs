use serde::{Deserialize, Deserializer};

/// Absent and `null` both decode to the type's default.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Links {
    #[serde(default)]
    pub circle: Option<i64>,
    #[serde(default)]
    pub supporting_circle: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CircleRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default)]
    pub strategy: Option<String>,
}

/// The role a circle fills inside its parent circle.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SupportedRole {
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub links: Links,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PersonSummary {
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RoleRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub links: Links,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Description {
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CircleLinked {
    #[serde(default, deserialize_with = "nullable")]
    pub supported_roles: Vec<SupportedRole>,
    #[serde(default, deserialize_with = "nullable")]
    pub domains: Vec<Description>,
}

/// Body of `GET /circles` and `GET /circles/{id}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CircleListing {
    #[serde(default, deserialize_with = "nullable")]
    pub circles: Vec<CircleRecord>,
    #[serde(default, deserialize_with = "nullable")]
    pub linked: CircleLinked,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PeopleEnvelope {
    #[serde(default, deserialize_with = "nullable")]
    pub people: Vec<PersonSummary>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RoleLinked {
    #[serde(default, deserialize_with = "nullable")]
    pub domains: Vec<Description>,
    #[serde(default, deserialize_with = "nullable")]
    pub circles: Vec<CircleRecord>,
    #[serde(default, deserialize_with = "nullable")]
    pub accountabilities: Vec<Description>,
    #[serde(default, deserialize_with = "nullable")]
    pub people: Vec<PersonSummary>,
}

/// Body of `GET /roles`, `GET /roles/{id}` and `GET /circles/{id}/roles`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RolesEnvelope {
    #[serde(default, deserialize_with = "nullable")]
    pub roles: Vec<RoleRecord>,
    #[serde(default, deserialize_with = "nullable")]
    pub linked: RoleLinked,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// A single circle with the records linked to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CircleDetail {
    pub circle: CircleRecord,
    pub supported_role: Option<SupportedRole>,
    pub domains: Vec<String>,
}

impl CircleDetail {
    pub fn purpose(&self) -> Option<&str> {
        self.supported_role.as_ref().and_then(|role| role.purpose.as_deref())
    }

    pub fn parent_circle(&self) -> Option<i64> {
        self.supported_role.as_ref().and_then(|role| role.links.circle)
    }
}

impl TryFrom<CircleListing> for CircleDetail {
    type Error = CircleListing;

    fn try_from(listing: CircleListing) -> Result<Self, Self::Error> {
        if listing.circles.is_empty() {
            return Err(listing);
        }
        let CircleListing { mut circles, linked } = listing;
        Ok(Self {
            circle: circles.swap_remove(0),
            supported_role: linked.supported_roles.into_iter().next(),
            domains: linked.domains.into_iter().map(|domain| domain.description).collect(),
        })
    }
}

/// A single role with its domains, circle, accountabilities and people.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleDetail {
    pub role: RoleRecord,
    pub domains: Vec<String>,
    pub circle: Option<CircleRecord>,
    pub accountabilities: Vec<String>,
    pub people: Vec<PersonSummary>,
}

impl TryFrom<RolesEnvelope> for RoleDetail {
    type Error = RolesEnvelope;

    fn try_from(envelope: RolesEnvelope) -> Result<Self, Self::Error> {
        if envelope.roles.is_empty() {
            return Err(envelope);
        }
        let RolesEnvelope { mut roles, linked } = envelope;
        Ok(Self {
            role: roles.swap_remove(0),
            domains: linked.domains.into_iter().map(|domain| domain.description).collect(),
            circle: linked.circles.into_iter().next(),
            accountabilities: linked
                .accountabilities
                .into_iter()
                .map(|accountability| accountability.description)
                .collect(),
            people: linked.people,
        })
    }
}
