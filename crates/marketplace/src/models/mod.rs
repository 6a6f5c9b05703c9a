//! Domain models for the marketplace.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod profile;
pub mod session;
pub mod stats;
pub mod verification;

pub use cart::{AddToCart, Cart, CartLine, CartProduct, SetQuantity};
pub use catalog::{
    Category, CategoryRef, LowStockProduct, NewProduct, Product, ProductFilter, ProductInput,
    ProductListing, ProductUpdate, SupplierRef,
};
pub use order::{
    CheckoutLine, CreateOrderRequest, Order, OrderDetails, OrderItemDetail, OrderLineRequest,
    OrderScope, OrderView, StatusUpdateRequest, StockedProduct,
};
pub use profile::{
    NewProfile, NewSupplier, NotificationPreferences, NotificationUpdate, Profile, ProfileUpdate,
    Supplier, SupplierListing,
};
pub use session::{CurrentUser, keys as session_keys};
pub use stats::{ActivityEvent, ActivityKind, AdminStats, SupplierStats, merge_activity};
pub use verification::{
    DocumentRef, ResubmitRequest, ReviewSubject, Verification, VerificationDecision,
    VerificationDocument, VerificationSummary, VerificationView,
};
