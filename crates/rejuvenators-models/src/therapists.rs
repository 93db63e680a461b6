//! Therapist profile models and DTOs.

use chrono::{DateTime, Utc};
use rejuvenators_core::file_storage::optimized_image_url;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{TherapistId, UserId};

/// Avatar edge in CSS pixels. Display URLs request twice this for HiDPI.
pub const AVATAR_SIZE: u32 = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TherapistProfile {
    pub id: TherapistId,
    /// Console account linked to this profile, if any
    pub user_id: Option<UserId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    /// Public URL of the uploaded photo
    pub profile_pic: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TherapistProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A profile plus the resized photo URL the console renders.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TherapistProfileView {
    #[serde(flatten)]
    pub profile: TherapistProfile,
    pub photo_display_url: Option<String>,
}

impl From<TherapistProfile> for TherapistProfileView {
    fn from(profile: TherapistProfile) -> Self {
        let photo_display_url = profile
            .profile_pic
            .as_deref()
            .map(|url| optimized_image_url(url, AVATAR_SIZE * 2, AVATAR_SIZE * 2));
        Self {
            profile,
            photo_display_url,
        }
    }
}

/// Fields a therapist may change on their own profile.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateTherapistProfileDto {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
}

impl UpdateTherapistProfileDto {
    pub fn apply_to(&self, profile: &mut TherapistProfile) {
        if let Some(v) = &self.first_name {
            profile.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            profile.last_name = v.clone();
        }
        if let Some(v) = &self.phone {
            profile.phone = Some(v.clone());
        }
        if let Some(v) = &self.bio {
            profile.bio = Some(v.clone());
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TherapistListResponse {
    pub data: Vec<TherapistProfileView>,
}
