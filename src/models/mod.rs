pub mod booking;
pub mod hotel;
pub mod location;
pub mod promotion;
pub mod review;
pub mod room;
pub mod user;

pub use booking::{Booking, BookingStatus, PaymentMethod, PaymentStatus};
pub use hotel::Hotel;
pub use location::Location;
pub use promotion::Promotion;
pub use review::{Review, ReviewStatus};
pub use room::{Room, RoomStatus};
pub use user::{Role, User};
