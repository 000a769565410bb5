use serde::{Deserialize, Serialize};

use crate::error::{CardError, CardResult};

pub const MAX_SKILLS: usize = 3;

/// One stat line on a finished card. Values are expected to sit in the
/// 85..=99 band the completion prompt asks for (90..=99 for fallback stats).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatEntry {
    pub label: String,
    pub value: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsRequest {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl StatsRequest {
    pub fn validate(&self) -> CardResult<()> {
        validate_identity(&self.name, &self.title)?;
        validate_skills(&self.skills)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortraitRequest {
    pub description: String,
}

impl PortraitRequest {
    pub fn validate(&self) -> CardResult<()> {
        require_non_empty("description", &self.description)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnhanceRequest {
    #[serde(default)]
    pub photo: Option<String>,
    pub name: String,
    pub title: String,
}

impl EnhanceRequest {
    pub fn validate(&self) -> CardResult<()> {
        validate_identity(&self.name, &self.title)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FanoutRequest {
    pub description: String,
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl FanoutRequest {
    pub fn validate(&self) -> CardResult<()> {
        require_non_empty("description", &self.description)?;
        validate_identity(&self.name, &self.title)?;
        validate_skills(&self.skills)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveCardRequest {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub stats: Vec<StatEntry>,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub image: String,
}

impl SaveCardRequest {
    pub fn validate(&self) -> CardResult<()> {
        validate_identity(&self.name, &self.title)?;
        validate_skills(&self.skills)?;
        require_non_empty("image", &self.image)
    }
}

fn require_non_empty(field: &str, value: &str) -> CardResult<()> {
    if value.trim().is_empty() {
        return Err(CardError::Validation(format!("{field} is required")));
    }
    Ok(())
}

pub fn validate_identity(name: &str, title: &str) -> CardResult<()> {
    require_non_empty("name", name)?;
    require_non_empty("title", title)
}

pub fn validate_skills(skills: &[String]) -> CardResult<()> {
    if skills.len() > MAX_SKILLS {
        return Err(CardError::Validation(format!(
            "at most {MAX_SKILLS} skills are allowed"
        )));
    }
    if skills.iter().any(|skill| skill.trim().is_empty()) {
        return Err(CardError::Validation("skills must not be empty".to_string()));
    }
    Ok(())
}
