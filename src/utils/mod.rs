pub mod responses;
pub mod session;
pub mod templates;

pub use responses::json_error;
pub use session::{clear_user_session, get_current_user_id, set_user_session};
pub use templates::render_template;
