//! Schema context handed to the candidate generator.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One table the generator may use, with enough shape for it to pick
/// columns sensibly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaTable {
    /// Schema-qualified name (`Sales.Customer`).
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub description: String,
}

/// The queryable slice of the database, as described to the generator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaContext {
    pub tables: Vec<SchemaTable>,
}

impl SchemaContext {
    /// Loads a context from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read schema file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid schema file {}", path.display()))
    }

    /// Keeps only tables present in the allowlist, so the prompt never
    /// advertises something the validator would reject.
    pub fn restricted_to(&self, allowlist: &sqlgate_core::Allowlist) -> Self {
        Self {
            tables: self
                .tables
                .iter()
                .filter(|t| allowlist.contains(&t.name))
                .cloned()
                .collect(),
        }
    }

    /// Renders the prompt section describing the schema.
    pub fn prompt_block(&self) -> String {
        let mut out = String::new();
        for table in &self.tables {
            out.push_str(&table.name);
            out.push_str(":\n");
            if !table.description.is_empty() {
                out.push_str("  Description: ");
                out.push_str(&table.description);
                out.push('\n');
            }
            out.push_str("  Columns: ");
            out.push_str(&table.columns.join(", "));
            out.push_str("\n\n");
        }
        out
    }

    /// Built-in AdventureWorks subset matching the default allowlist.
    pub fn adventureworks() -> Self {
        let table = |name: &str, description: &str, columns: &[&str]| SchemaTable {
            name: name.to_string(),
            description: description.to_string(),
            columns: columns.iter().map(ToString::to_string).collect(),
        };

        Self {
            tables: vec![
                table(
                    "Production.Product",
                    "Products catalog with pricing and categorization",
                    &[
                        "ProductID",
                        "Name",
                        "ProductNumber",
                        "Color",
                        "ListPrice",
                        "StandardCost",
                        "ProductSubcategoryID",
                    ],
                ),
                table(
                    "Production.ProductCategory",
                    "Product categories (Bikes, Components, Clothing, Accessories)",
                    &["ProductCategoryID", "Name", "ModifiedDate"],
                ),
                table(
                    "Production.ProductSubcategory",
                    "Product subcategories like Road Bikes, Mountain Bikes",
                    &["ProductSubcategoryID", "ProductCategoryID", "Name"],
                ),
                table(
                    "Sales.Customer",
                    "Customer records with territory assignments",
                    &[
                        "CustomerID",
                        "PersonID",
                        "StoreID",
                        "TerritoryID",
                        "AccountNumber",
                    ],
                ),
                table(
                    "Sales.SalesOrderHeader",
                    "Sales order headers with customer and financial information",
                    &[
                        "SalesOrderID",
                        "OrderDate",
                        "DueDate",
                        "ShipDate",
                        "Status",
                        "CustomerID",
                        "TerritoryID",
                        "SubTotal",
                        "TaxAmt",
                        "Freight",
                        "TotalDue",
                    ],
                ),
                table(
                    "Sales.SalesOrderDetail",
                    "Individual line items for sales orders",
                    &[
                        "SalesOrderID",
                        "SalesOrderDetailID",
                        "OrderQty",
                        "ProductID",
                        "UnitPrice",
                        "UnitPriceDiscount",
                        "LineTotal",
                    ],
                ),
                table(
                    "Person.Person",
                    "Person records for customers and employees",
                    &[
                        "BusinessEntityID",
                        "PersonType",
                        "Title",
                        "FirstName",
                        "MiddleName",
                        "LastName",
                    ],
                ),
                table(
                    "Person.Address",
                    "Address information for customers and locations",
                    &[
                        "AddressID",
                        "AddressLine1",
                        "AddressLine2",
                        "City",
                        "StateProvinceID",
                        "PostalCode",
                    ],
                ),
            ],
        }
    }
}
