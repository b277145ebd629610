//! Transaction lifecycle engine for peer-to-peer rentals and sales.
//!
//! Every mutation goes through [`Engine`]: trade creation, guarded status
//! transitions, inventory reservation, shipment records, channel bindings
//! and notification events. The HTTP layer, auth, chat transport and
//! notification delivery all live outside this crate.

pub use applications::{Application, ApplicationKind, ApplicationStatus};
pub use channels::{Channel, chat_deadline, chat_open};
pub use commands::{
    BuyoutCmd, GoodNewCmd, TradeListCmd, TradeMeta, TradeNewCmd, TransitionCmd,
};
pub use contact::ContactSnapshot;
pub use error::EngineError;
pub use goods::{Good, GoodStatus, ListingKind};
pub use notifications::Notification;
pub use ops::{Engine, EngineBuilder};
pub use pricing::{BuyoutTerms, rental_days};
pub use purchases::{Purchase, PurchaseStatus, ReturnStatus};
pub use rentals::{Rental, RentalStatus};
pub use shipments::{Shipment, ShipmentDirection, ShipmentStatus};
pub use trade::{Party, TradeAction, TradeKind, TradeRef, TradeSide, TradeView};

pub mod applications;
pub mod channels;
mod commands;
mod contact;
mod error;
pub mod goods;
pub mod notifications;
mod ops;
mod pricing;
pub mod purchases;
pub mod rentals;
pub mod shipments;
mod trade;
pub mod users;

type ResultEngine<T> = Result<T, EngineError>;
