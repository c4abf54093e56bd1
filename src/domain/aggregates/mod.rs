//! Aggregates module
pub mod cart;
pub mod coupon;
pub mod order;
pub mod payment;
pub mod product;

pub use cart::{CartLine, CartSummary, LineRef};
pub use coupon::{Coupon, DiscountType};
pub use order::{BillingInfo, Order, OrderStatus, OrderWithDetails, UserSummary};
pub use payment::{Payment, PaymentMethod, PaymentStatus};
pub use product::{Package, PackageWithItems, Product, ProductType};
