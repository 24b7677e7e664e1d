pub mod comment;
pub mod member;
pub mod notification;
pub mod reaction;
pub mod refresh_token;
pub mod review;
pub mod video;

pub use comment::{Entity as Comment, Model as CommentModel};
pub use member::{Entity as Member, Model as MemberModel};
pub use notification::{Entity as Notification, Model as NotificationModel};
pub use reaction::{Entity as Reaction, Model as ReactionModel};
pub use refresh_token::Entity as RefreshToken;
pub use review::{Entity as Review, Model as ReviewModel};
pub use video::{Entity as Video, Model as VideoModel};
