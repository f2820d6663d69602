// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only vehicle catalog collaborator.
//!
//! The chat core only needs catalog data to denormalize vehicle snapshots
//! into chat sessions and overview listings. Lookup never fails: unknown
//! ids resolve to a placeholder so a stale reference degrades to an
//! "unknown vehicle" display instead of an error.

use serde::{Deserialize, Serialize};

/// A catalog vehicle, as denormalized into sessions and listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub year: i32,
    pub price: f64,
    pub image_url: String,
}

/// In-process vehicle catalog.
#[derive(Debug, Clone)]
pub struct VehicleCatalog {
    vehicles: Vec<Vehicle>,
}

impl VehicleCatalog {
    /// The dealership's built-in stock.
    pub fn builtin() -> Self {
        let vehicle = |id: &str, name: &str, brand: &str, year: i32, price: f64, image: &str| {
            Vehicle {
                id: id.to_string(),
                name: name.to_string(),
                brand: brand.to_string(),
                year,
                price,
                image_url: image.to_string(),
            }
        };
        Self {
            vehicles: vec![
                vehicle("suv-1", "Volkswagen T-Cross", "Volkswagen", 2024, 139_900.0, "https://images.unsplash.com/photo-1606664515524-ed2f786a0bd6?w=800"),
                vehicle("suv-2", "Hyundai Creta", "Hyundai", 2024, 149_900.0, "https://images.unsplash.com/photo-1619682817481-e994891cd1f5?w=800"),
                vehicle("suv-3", "Honda HR-V", "Honda", 2024, 159_900.0, "https://images.unsplash.com/photo-1621007947382-bb3c3994e3fb?w=800"),
                vehicle("esp-1", "BMW X5 M Sport", "BMW", 2024, 589_000.0, "https://images.unsplash.com/photo-1555215695-3004980ad54e?w=800"),
                vehicle("esp-2", "Mercedes-Benz C300", "Mercedes-Benz", 2023, 389_000.0, "https://images.unsplash.com/photo-1618843479313-40f8afb4b4d8?w=800"),
                vehicle("esp-3", "BMW M5 Competition", "BMW", 2024, 899_000.0, "https://images.unsplash.com/photo-1555215695-3004980ad54e?w=800"),
                vehicle("sedan-1", "Chevrolet Onix Plus", "Chevrolet", 2024, 89_900.0, "https://images.unsplash.com/photo-1590362891991-f776e747a588?w=800"),
                vehicle("sedan-2", "Hyundai HB20S", "Hyundai", 2024, 94_900.0, "https://images.unsplash.com/photo-1609521263047-f8f205293f24?w=800"),
            ],
        }
    }

    /// Build a catalog from an explicit vehicle list (tests, future imports).
    pub fn new(vehicles: Vec<Vehicle>) -> Self {
        Self { vehicles }
    }

    pub fn all(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// Look up a vehicle by id, falling back to a placeholder.
    pub fn lookup(&self, id: &str) -> Vehicle {
        self.vehicles
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .unwrap_or_else(|| Self::placeholder(id))
    }

    /// Placeholder for ids the catalog does not know (including the
    /// `generic` reference used by negotiations without a catalog vehicle).
    pub fn placeholder(id: &str) -> Vehicle {
        Vehicle {
            id: id.to_string(),
            name: "Unknown vehicle".to_string(),
            brand: "N/A".to_string(),
            year: 0,
            price: 0.0,
            image_url: String::new(),
        }
    }
}

impl Default for VehicleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_vehicle() {
        let catalog = VehicleCatalog::builtin();
        let car = catalog.lookup("suv-2");
        assert_eq!(car.name, "Hyundai Creta");
        assert_eq!(car.price, 149_900.0);
    }

    #[test]
    fn lookup_unknown_vehicle_falls_back_to_placeholder() {
        let catalog = VehicleCatalog::builtin();
        let car = catalog.lookup("generic");
        assert_eq!(car.id, "generic");
        assert_eq!(car.name, "Unknown vehicle");
        assert_eq!(car.price, 0.0);
    }
}
