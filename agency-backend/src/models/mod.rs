mod api_key;
mod contact;
mod email;
mod session;
mod social_post;
mod task;
mod transaction;

pub use api_key::{ApiKey, ApiKeyResponse};
pub use contact::{Contact, NewContact};
pub use email::{EmailLog, EmailStatus, MAX_EMAIL_ATTEMPTS};
pub use session::Session;
pub use social_post::{NewSocialPost, PostStatus, SocialPost, SUPPORTED_PLATFORMS};
pub use task::{SphereTask, TaskStatus, TaskType};
pub use transaction::{Transaction, TransactionStatus};
