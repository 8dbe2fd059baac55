//! Cart file persistence: one CSV row and one narrative receipt per order.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use crate::domain::order::Order;
use crate::errors::PersistenceError;

const CSV_HEADER: &str = "order_id,product_name,product_id,price,quality,customer_name,\
customer_address,customer_phone,payment_status,shipping_status,estimated_delivery";
const BANNER: &str = "==================================================";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartFiles {
    pub csv_path: PathBuf,
    pub txt_path: PathBuf,
}

/// Write both cart artifacts stamped with the local wall clock.
pub fn persist(order: &Order, base_dir: &Path) -> Result<CartFiles, PersistenceError> {
    persist_at(order, base_dir, Local::now().naive_local())
}

/// Deterministic inner writer; `timestamp` fixes both filenames and the
/// purchase date line.
pub fn persist_at(
    order: &Order,
    base_dir: &Path,
    timestamp: NaiveDateTime,
) -> Result<CartFiles, PersistenceError> {
    fs::create_dir_all(base_dir)
        .map_err(|source| PersistenceError::CreateDir { path: base_dir.to_path_buf(), source })?;

    let stem =
        format!("cart_{}_{}", order.order_id.replace('-', "_"), timestamp.format("%Y%m%d_%H%M%S"));
    let csv_path = base_dir.join(format!("{stem}.csv"));
    let txt_path = base_dir.join(format!("{stem}.txt"));

    let write = |path: &PathBuf, contents: String| {
        fs::write(path, contents)
            .map_err(|source| PersistenceError::WriteFile { path: path.clone(), source })
    };
    write(&csv_path, render_csv(order))?;
    write(&txt_path, render_txt(order, timestamp))?;

    tracing::info!(
        order_id = %order.order_id,
        csv = %csv_path.display(),
        txt = %txt_path.display(),
        "cart files written"
    );
    Ok(CartFiles { csv_path, txt_path })
}

fn render_csv(order: &Order) -> String {
    let row = [
        order.order_id.as_str(),
        order.product.product_name.as_str(),
        order.product.product_id.as_str(),
        &order.product.price.to_string(),
        order.product.quality.as_str(),
        order.customer.name.as_str(),
        order.customer.address.as_str(),
        order.customer.phone.as_str(),
        order.payment_status.as_str(),
        order.shipping_status.as_str(),
        order.estimated_delivery.as_str(),
    ]
    .map(csv_field)
    .join(",");
    format!("{CSV_HEADER}\n{row}\n")
}

fn csv_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

fn render_txt(order: &Order, timestamp: NaiveDateTime) -> String {
    format!(
        "ORDER CONFIRMATION - {order_id}\n\
         {BANNER}\n\
         Purchase Date: {purchase_date}\n\n\
         PRODUCT DETAILS:\n\
         Product: {product_name}\n\
         Product ID: {product_id}\n\
         Price: ${price}\n\
         Quality: {quality}\n\n\
         CUSTOMER INFORMATION:\n\
         Name: {name}\n\
         Address: {address}\n\
         Phone: {phone}\n\n\
         ORDER STATUS:\n\
         Payment Status: {payment_status}\n\
         Shipping Status: {shipping_status}\n\
         Estimated Delivery: {estimated_delivery}\n\
         {BANNER}\n\
         Thank you for shopping with us!\n",
        order_id = order.order_id,
        purchase_date = timestamp.format("%Y-%m-%d %H:%M:%S"),
        product_name = order.product.product_name,
        product_id = order.product.product_id,
        price = order.product.price,
        quality = order.product.quality,
        name = order.customer.name,
        address = order.customer.address,
        phone = order.customer.phone,
        payment_status = order.payment_status,
        shipping_status = order.shipping_status,
        estimated_delivery = order.estimated_delivery,
    )
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::NaiveDate;

    use super::{persist_at, CSV_HEADER};
    use crate::domain::order::{Customer, Order};
    use crate::domain::product::ProductMatch;

    fn order(id: &str) -> Order {
        Order {
            order_id: id.to_string(),
            product: ProductMatch {
                product_id: "101".to_string(),
                product_name: "Red Jacket".to_string(),
                price: 49.99,
                quality: "Premium".to_string(),
                in_stock: true,
                description: String::new(),
                match_score: 85,
                reasoning: String::new(),
            },
            customer: Customer {
                name: "Ada Lovelace".to_string(),
                address: "1 Analytical Way, London".to_string(),
                phone: "555-0100".to_string(),
            },
            payment_status: "completed".to_string(),
            shipping_status: "processing".to_string(),
            estimated_delivery: "2024-01-08".to_string(),
        }
    }

    fn noon(day: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .expect("valid date")
            .and_hms_opt(12, 0, 0)
            .expect("valid time")
    }

    #[test]
    fn filenames_substitute_dashes_and_carry_the_timestamp() {
        let dir = tempfile::tempdir().expect("temp dir");
        let files = persist_at(&order("ORD-123"), dir.path(), noon(1)).expect("persist");

        assert_eq!(
            files.csv_path.file_name().and_then(|n| n.to_str()),
            Some("cart_ORD_123_20240101_120000.csv")
        );
        assert_eq!(
            files.txt_path.file_name().and_then(|n| n.to_str()),
            Some("cart_ORD_123_20240101_120000.txt")
        );
    }

    #[test]
    fn csv_has_fixed_header_and_quoted_row() {
        let dir = tempfile::tempdir().expect("temp dir");
        let files = persist_at(&order("ORD-123"), dir.path(), noon(1)).expect("persist");
        let contents = fs::read_to_string(&files.csv_path).expect("read csv");

        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert_eq!(CSV_HEADER.split(',').count(), 11);

        let row = lines.next().expect("data row");
        assert!(row.starts_with("ORD-123,Red Jacket,101,49.99,Premium,Ada Lovelace"));
        // The comma inside the address forces quoting.
        assert!(row.contains("\"1 Analytical Way, London\""));
        assert!(row.ends_with("completed,processing,2024-01-08"));
    }

    #[test]
    fn txt_receipt_has_banner_and_labelled_sections() {
        let dir = tempfile::tempdir().expect("temp dir");
        let files = persist_at(&order("ORD-9"), dir.path(), noon(2)).expect("persist");
        let contents = fs::read_to_string(&files.txt_path).expect("read txt");

        assert!(contents.starts_with("ORDER CONFIRMATION - ORD-9\n"));
        assert_eq!(contents.matches('=').count(), 100);
        assert!(contents.contains("Purchase Date: 2024-01-02 12:00:00"));
        assert!(contents.contains("PRODUCT DETAILS:\nProduct: Red Jacket"));
        assert!(contents.contains("CUSTOMER INFORMATION:\nName: Ada Lovelace"));
        assert!(contents.contains("ORDER STATUS:\nPayment Status: completed"));
        assert!(contents.ends_with("Thank you for shopping with us!\n"));
    }

    #[test]
    fn distinct_timestamps_never_collide_for_the_same_order() {
        let dir = tempfile::tempdir().expect("temp dir");
        let first = persist_at(&order("ORD-123"), dir.path(), noon(1)).expect("first persist");
        let second = persist_at(&order("ORD-123"), dir.path(), noon(3)).expect("second persist");

        assert_ne!(first.csv_path, second.csv_path);
        assert_ne!(first.txt_path, second.txt_path);
        assert!(first.csv_path.exists() && second.csv_path.exists());
    }

    #[test]
    fn missing_base_directory_is_created() {
        let dir = tempfile::tempdir().expect("temp dir");
        let nested = dir.path().join("shopping_cart");
        let files = persist_at(&order("ORD-1"), &nested, noon(1)).expect("persist into new dir");
        assert!(files.csv_path.starts_with(&nested));
    }

    #[test]
    fn unwritable_target_reports_structured_failure() {
        let dir = tempfile::tempdir().expect("temp dir");
        // A regular file where the directory should be.
        let blocker = dir.path().join("cart_dir");
        fs::write(&blocker, "not a directory").expect("write blocker");

        let error = persist_at(&order("ORD-1"), &blocker, noon(1))
            .expect_err("persist must fail without panicking");
        assert!(error.to_string().contains("cart"));
    }
}
