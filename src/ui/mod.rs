pub mod button;
pub mod frame;
pub mod input_area;
pub mod interaction;
pub mod select_list;
pub mod surface;
pub mod theme;

pub use button::{Button, CheckBox, RadioButton};
pub use frame::{Alignment, Frame, HAlign, Length, Overflow, Unit, VAlign};
pub use input_area::InputArea;
pub use interaction::InteractionState;
pub use select_list::SelectList;
pub use surface::Surface;
pub use theme::{Color, Theme, ThemeSlot};
