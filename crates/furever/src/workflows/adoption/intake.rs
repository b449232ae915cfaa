use super::domain::{AdoptionRequest, DirectAddForm, SurrenderSubmission};
use crate::workflows::accounts::service::is_valid_email;

/// Upload cap for inline photos, mirroring the public form limit.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Minimum length of the free-text adoption message.
pub const MIN_MESSAGE_CHARS: usize = 20;

/// Validation errors raised by the intake guard. Nothing is written to the
/// store when any of these fire.
#[derive(Debug, thiserror::Error)]
pub enum IntakeViolation {
    #[error("required field '{0}' is missing")]
    MissingField(&'static str),
    #[error("'{0}' is not a valid e-mail address")]
    InvalidEmail(String),
    #[error("image payload must be a base64 data URI")]
    MalformedImage,
    #[error("image media type '{0}' is not a supported image format")]
    UnsupportedImageType(String),
    #[error("image is {found} bytes, above the {limit} byte cap")]
    ImageTooLarge { limit: usize, found: usize },
    #[error("adoption message must be at least {minimum} characters")]
    MessageTooShort { minimum: usize },
}

/// Guard validating form payloads before they reach the document store.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard;

impl IntakeGuard {
    pub fn new() -> Self {
        Self
    }

    /// Check a surrender submission: every contact and pet field present,
    /// owner e-mail well formed, photo present and within the upload cap.
    pub fn check_surrender(&self, submission: &SurrenderSubmission) -> Result<(), IntakeViolation> {
        require("name", &submission.name)?;
        require("breed", &submission.breed)?;
        require("description", &submission.description)?;
        require("owner_name", &submission.owner.name)?;
        require("owner_email", &submission.owner.email)?;
        require("owner_phone", &submission.owner.phone)?;
        require("owner_address", &submission.owner.address)?;

        if !is_valid_email(&submission.owner.email) {
            return Err(IntakeViolation::InvalidEmail(submission.owner.email.clone()));
        }

        self.check_image(&submission.image.data_url, &submission.image.mime_type)
    }

    /// Check an administrator direct-add: pet fields and photo only, no
    /// owner contact to validate.
    pub fn check_direct_add(&self, form: &DirectAddForm) -> Result<(), IntakeViolation> {
        require("name", &form.name)?;
        require("breed", &form.breed)?;
        require("description", &form.description)?;
        self.check_image(&form.image.data_url, &form.image.mime_type)
    }

    /// Check an adoption request: applicant contact complete, e-mail well
    /// formed, and a message long enough to review.
    pub fn check_request(&self, request: &AdoptionRequest) -> Result<(), IntakeViolation> {
        require("applicant_name", &request.applicant.name)?;
        require("applicant_email", &request.applicant.email)?;
        require("applicant_phone", &request.applicant.phone)?;
        require("applicant_address", &request.applicant.address)?;

        if !is_valid_email(&request.applicant.email) {
            return Err(IntakeViolation::InvalidEmail(
                request.applicant.email.clone(),
            ));
        }

        if request.message.trim().chars().count() < MIN_MESSAGE_CHARS {
            return Err(IntakeViolation::MessageTooShort {
                minimum: MIN_MESSAGE_CHARS,
            });
        }

        Ok(())
    }

    fn check_image(&self, data_url: &str, mime_type: &str) -> Result<(), IntakeViolation> {
        let parsed: mime::Mime = mime_type
            .parse()
            .map_err(|_| IntakeViolation::UnsupportedImageType(mime_type.to_string()))?;
        if parsed.type_() != mime::IMAGE {
            return Err(IntakeViolation::UnsupportedImageType(mime_type.to_string()));
        }

        let payload = data_url
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(',').map(|(_, payload)| payload))
            .ok_or(IntakeViolation::MalformedImage)?;
        if payload.is_empty() {
            return Err(IntakeViolation::MalformedImage);
        }

        // Base64 expands 3 bytes into 4 characters; close enough for a cap.
        let decoded = payload.len() / 4 * 3;
        if decoded > MAX_IMAGE_BYTES {
            return Err(IntakeViolation::ImageTooLarge {
                limit: MAX_IMAGE_BYTES,
                found: decoded,
            });
        }

        Ok(())
    }
}

fn require(field: &'static str, value: &str) -> Result<(), IntakeViolation> {
    if value.trim().is_empty() {
        return Err(IntakeViolation::MissingField(field));
    }
    Ok(())
}
