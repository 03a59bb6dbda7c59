//! Domain models for pos-service.

mod cash_day;
mod client;
mod product;
mod sale;
mod supplier;
mod user;

pub use cash_day::{
    compute_close, CashDay, CashDayStatus, CashDayWithSales, CloseTotals, ClosedDaySummary,
    ExtraExpense, SupplierPayment,
};
pub use client::{Client, CreateClient, UpdateClient};
pub use product::{CreateProduct, Product, UpdateProduct};
pub use sale::{NewSale, NewSaleItem, Sale, SaleItem, SaleStatus, SaleWithItems};
pub use supplier::{CreateSupplier, Supplier, UpdateSupplier};
pub use user::{CreateUser, SanitizedUser, User, UserRole};
