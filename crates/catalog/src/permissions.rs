use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::{IntoEnumIterator, VariantNames};
use strum_macros::{Display, EnumIter, EnumString};

#[derive(
	Debug,
	Clone,
	Copy,
	PartialEq,
	Eq,
	Hash,
	Serialize,
	Deserialize,
	Display,
	EnumString,
	EnumIter,
	VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
	Admin,
	Manager,
	Designer,
	Operator,
	Accountant,
}

#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Permission {
	ViewOrders,
	ManageOrders,
	ManageDesigns,
	ApproveProofs,
	ManageProduction,
	ManageAccounting,
	ManageStock,
	ManageCustomers,
	ManageUsers,
}

static GRANTS: Lazy<HashMap<Role, HashSet<Permission>>> = Lazy::new(|| {
	use Permission::{
		ApproveProofs, ManageAccounting, ManageCustomers, ManageDesigns, ManageOrders,
		ManageProduction, ManageStock, ViewOrders,
	};

	let mut grants = HashMap::new();
	grants.insert(Role::Admin, Permission::iter().collect());
	grants.insert(
		Role::Manager,
		HashSet::from([
			ViewOrders,
			ManageOrders,
			ManageDesigns,
			ApproveProofs,
			ManageProduction,
			ManageStock,
			ManageCustomers,
		]),
	);
	grants.insert(
		Role::Designer,
		HashSet::from([ViewOrders, ManageDesigns, ApproveProofs]),
	);
	grants.insert(
		Role::Operator,
		HashSet::from([ViewOrders, ManageProduction, ManageStock]),
	);
	grants.insert(
		Role::Accountant,
		HashSet::from([ViewOrders, ManageAccounting, ManageCustomers]),
	);
	grants
});

impl Role {
	#[must_use]
	pub fn can(self, permission: Permission) -> bool {
		GRANTS
			.get(&self)
			.is_some_and(|granted| granted.contains(&permission))
	}

	/// Granted permissions in declaration order.
	pub fn permissions(self) -> impl Iterator<Item = Permission> {
		Permission::iter().filter(move |permission| self.can(*permission))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn admins_can_do_everything() {
		assert!(Permission::iter().all(|permission| Role::Admin.can(permission)));
	}

	#[test]
	fn every_role_can_view_orders() {
		assert!(Role::iter().all(|role| role.can(Permission::ViewOrders)));
	}

	#[test]
	fn roles_are_scoped() {
		assert!(!Role::Designer.can(Permission::ManageProduction));
		assert!(!Role::Operator.can(Permission::ManageAccounting));
		assert!(!Role::Manager.can(Permission::ManageUsers));
		assert_eq!(
			Role::Operator.permissions().collect::<Vec<_>>(),
			vec![
				Permission::ViewOrders,
				Permission::ManageProduction,
				Permission::ManageStock
			]
		);
	}

	#[test]
	fn wire_names() {
		assert_eq!(Role::Accountant.to_string(), "accountant");
		assert_eq!(
			"approve_proofs".parse::<Permission>().unwrap(),
			Permission::ApproveProofs
		);
	}
}
