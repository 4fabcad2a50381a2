use std::sync::Arc;

use once_cell::sync::Lazy;
use pd_schema::{FieldSchema, ObjectSchema, Schema, SchemaRegistry};
use pd_transport::Method;
use strum::VariantNames;
use tracing::error;

use super::{
	resources::{
		ACCOUNTINGS, CUSTOMERS, DESIGNS, DESIGN_TYPES, MATERIAL_TYPES, ORDERS, PRODUCTIONS,
		PROOFING_ORDERS, STOCKS, USERS,
	},
	DesignStatus, OrderStatus, ProductionStatus, ProofingStatus, Role,
};

pub const PAYMENT_METHODS: &[&str] = &["cash", "card", "transfer"];

static CONTRACT: Lazy<SchemaRegistry> = Lazy::new(|| {
	let mut registry = SchemaRegistry::new();
	for schema in schemas() {
		if let Err(e) = registry.insert(schema) {
			error!(?e, "Skipping request schema");
		}
	}
	registry
});

/// The request validators, one per backend request type.
pub fn contract() -> &'static SchemaRegistry {
	&CONTRACT
}

/// Name of the schema that guards `method` on `root`, if the request carries a body worth
/// validating.
#[must_use]
pub fn mutation_schema(root: &str, method: Method) -> Option<&'static str> {
	let name = match (root, method) {
		(ORDERS, Method::Post) => "OrderCreate",
		(ORDERS, Method::Put | Method::Patch) => "OrderUpdate",
		(DESIGNS, Method::Post | Method::Patch) => "DesignAssign",
		(PROOFING_ORDERS, Method::Post | Method::Patch) => "ProofingDecision",
		(PRODUCTIONS, Method::Post | Method::Patch) => "ProductionUpdate",
		(ACCOUNTINGS, Method::Post) => "AccountingEntry",
		(CUSTOMERS, Method::Post | Method::Put) => "CustomerCreate",
		(STOCKS, Method::Post) => "StockAdjust",
		(DESIGN_TYPES, Method::Post) => "DesignTypeCreate",
		(MATERIAL_TYPES, Method::Post) => "MaterialTypeCreate",
		(USERS, Method::Post) => "UserCreate",
		_ => return None,
	};

	Some(name)
}

fn id() -> FieldSchema {
	FieldSchema::integer().min(1).coerce()
}

fn name(max: u32) -> FieldSchema {
	FieldSchema::text().trim().min(1).max(max)
}

fn schemas() -> Vec<Arc<dyn Schema>> {
	let order_item = ObjectSchema::new("OrderItem")
		.field("width_mm", FieldSchema::number().min(1).coerce())
		.field("height_mm", FieldSchema::number().min(1).coerce())
		.field("material_type_id", id())
		.field("copies", FieldSchema::integer().min(1).coerce());

	vec![
		Arc::new(
			ObjectSchema::new("OrderCreate")
				.field("quantity", FieldSchema::integer().min(0).coerce())
				// Walk-in orders have no customer record
				.field("customer_id", id().optional().nullable())
				.field("title", name(120).optional())
				.field("due_date", FieldSchema::date().optional())
				.field("rush", FieldSchema::boolean().coerce().optional())
				.field("items", FieldSchema::array(FieldSchema::object(order_item)).optional())
				.field("notes", FieldSchema::text().max(2000).optional().nullable()),
		),
		Arc::new(
			ObjectSchema::new("OrderUpdate")
				.field("status", FieldSchema::one_of(OrderStatus::VARIANTS).optional())
				.field("quantity", FieldSchema::integer().min(0).coerce().optional())
				.field("due_date", FieldSchema::date().optional().nullable())
				.field("notes", FieldSchema::text().max(2000).optional().nullable()),
		),
		Arc::new(
			ObjectSchema::new("DesignAssign")
				.field("order_id", id())
				.field("design_type_id", id())
				.field("designer_id", id().optional().nullable())
				.field("status", FieldSchema::one_of(DesignStatus::VARIANTS).optional()),
		),
		Arc::new(
			ObjectSchema::new("ProofingDecision")
				.field("design_id", id())
				.field("status", FieldSchema::one_of(ProofingStatus::VARIANTS))
				.field("comment", FieldSchema::text().max(1000).optional().nullable()),
		),
		Arc::new(
			ObjectSchema::new("ProductionUpdate")
				.field("order_id", id())
				.field("status", FieldSchema::one_of(ProductionStatus::VARIANTS))
				.field("machine", name(80).optional())
				.field(
					"printed_copies",
					FieldSchema::integer().min(0).coerce().optional(),
				),
		),
		Arc::new(
			ObjectSchema::new("AccountingEntry")
				.field("order_id", id())
				.field("amount", FieldSchema::number().min(0).coerce())
				.field("method", FieldSchema::one_of(PAYMENT_METHODS))
				.field("paid_at", FieldSchema::date().optional()),
		),
		Arc::new(
			ObjectSchema::new("CustomerCreate")
				.field("name", name(200))
				.field("phone", FieldSchema::text().trim().max(40).optional().nullable())
				.field("email", FieldSchema::text().trim().max(200).optional().nullable()),
		),
		Arc::new(
			ObjectSchema::new("StockAdjust")
				.field("material_type_id", id())
				.field("delta", FieldSchema::integer().coerce())
				.field("reason", name(200)),
		),
		Arc::new(ObjectSchema::new("DesignTypeCreate").field("name", name(80))),
		Arc::new(
			ObjectSchema::new("MaterialTypeCreate")
				.field("name", name(80))
				.field("unit", FieldSchema::one_of(&["sheet", "roll", "piece"])),
		),
		Arc::new(
			ObjectSchema::new("UserCreate")
				.field("username", FieldSchema::text().trim().min(3).max(64))
				.field("role", FieldSchema::one_of(Role::VARIANTS)),
		),
	]
}
