//! Website forms: payloads, validation and phone helpers.

mod model;
mod validation;

pub use model::{
    BookingForm, BookingRequest, ContactForm, ContactMessage, GetStartedForm, GetStartedInquiry,
};
pub use validation::{
    MAX_MESSAGE_CHARS, ValidationError, escape_html, is_valid_email, is_valid_phone,
    normalize_phone,
};
