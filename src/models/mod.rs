pub mod attendance;
pub mod event;
pub mod member;

pub use attendance::{Attendance, CheckInMethod, NewAttendance};
pub use event::Event;
pub use member::Member;
