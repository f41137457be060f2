//! Static descriptors for the synced Zoho Inventory resources.
//!
//! Each descriptor names the list endpoint, the JSON array holding the
//! records, the external ID field and the typed column table of the target
//! `PostgreSQL` table. The sync pipeline is driven entirely by these values.

use std::time::Duration;

use kool_data_hub_core::ColumnType;

use crate::config::RetryPolicy;

/// A target column and the type raw values are coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
}

/// Everything the pipeline needs to sync one resource.
#[derive(Debug)]
pub struct ResourceDescriptor {
    /// Stable name used in routes, env keys and logs (`sales_orders`).
    pub name: &'static str,
    /// List endpoint relative to the API base (`/salesorders`).
    pub endpoint: &'static str,
    /// Key of the record array in each page body.
    pub array_key: &'static str,
    /// External ID field, also the primary key column.
    pub id_field: &'static str,
    /// Schema-qualified target table.
    pub table: &'static str,
    /// Mapped columns, excluding the external ID.
    pub columns: &'static [Column],
    /// Query parameters always sent.
    pub params: &'static [(&'static str, &'static str)],
    /// Query parameters dropped when Zoho rejects them (code 2).
    pub optional_params: &'static [(&'static str, &'static str)],
    /// Per-page retry on connect/timeout failures.
    pub page_retry: RetryPolicy,
    /// Whole-job retry on connect/timeout failures.
    pub job_retry: RetryPolicy,
    /// Default 6-field cron expression (UTC).
    pub default_schedule: &'static str,
}

impl ResourceDescriptor {
    /// Look up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

macro_rules! columns {
    ($($name:ident: $ty:ident),* $(,)?) => {
        &[$(Column { name: stringify!($name), ty: ColumnType::$ty }),*]
    };
}

const SALES_ORDER_RETRY: RetryPolicy = RetryPolicy::new(3, Duration::from_secs(5));

pub static ITEMS: ResourceDescriptor = ResourceDescriptor {
    name: "items",
    endpoint: "/items",
    array_key: "items",
    id_field: "item_id",
    table: "zoho_nigeria_inventory.items",
    columns: columns![
        name: Text,
        sku: Text,
        unit: Text,
        status: Text,
        item_type: Text,
        product_type: Text,
        description: Text,
        rate: Float,
        purchase_rate: Float,
        purchase_description: Text,
        is_taxable: Boolean,
        tax_id: Text,
        tax_name: Text,
        tax_percentage: Float,
        stock_on_hand: Float,
        available_stock: Float,
        actual_available_stock: Float,
        reorder_level: Float,
        brand: Text,
        manufacturer: Text,
        category_id: Text,
        category_name: Text,
        group_id: Text,
        group_name: Text,
        is_combo_product: Boolean,
        has_attachment: Boolean,
        image_name: Text,
        upc: Text,
        ean: Text,
        isbn: Text,
        part_number: Text,
        source: Text,
        custom_fields: Json,
        tags: Json,
        created_time: Timestamp,
        last_modified_time: Timestamp,
    ],
    params: &[],
    optional_params: &[],
    page_retry: RetryPolicy::NONE,
    job_retry: RetryPolicy::NONE,
    default_schedule: "0 */15 * * * *",
};

pub static COMPOSITE_ITEMS: ResourceDescriptor = ResourceDescriptor {
    name: "composite_items",
    endpoint: "/compositeitems",
    array_key: "composite_items",
    id_field: "composite_item_id",
    table: "zoho_nigeria_inventory.composite_items",
    columns: columns![
        name: Text,
        sku: Text,
        unit: Text,
        status: Text,
        description: Text,
        item_type: Text,
        product_type: Text,
        rate: Float,
        purchase_rate: Float,
        stock_on_hand: Float,
        available_stock: Float,
        actual_available_stock: Float,
        reorder_level: Float,
        is_combo_product: Boolean,
        tax_id: Text,
        tax_name: Text,
        tax_percentage: Float,
        image_name: Text,
        mapped_items: Json,
        custom_fields: Json,
        tags: Json,
        created_time: Timestamp,
        last_modified_time: Timestamp,
    ],
    params: &[],
    optional_params: &[],
    page_retry: RetryPolicy::NONE,
    job_retry: RetryPolicy::NONE,
    default_schedule: "0 0 14 * * *",
};

pub static PRICE_LISTS: ResourceDescriptor = ResourceDescriptor {
    name: "price_lists",
    endpoint: "/pricebooks",
    array_key: "pricebooks",
    id_field: "pricebook_id",
    table: "zoho_nigeria_inventory.price_lists",
    columns: columns![
        name: Text,
        description: Text,
        currency_id: Text,
        currency_code: Text,
        status: Text,
        pricebook_type: Text,
        sales_or_purchase_type: Text,
        percentage: Float,
        pricebook_rate: Float,
        is_increase: Boolean,
        rounding_type: Text,
        decimal_place: Float,
        pricing_scheme: Text,
        last_modified_time: Timestamp,
    ],
    params: &[],
    optional_params: &[],
    page_retry: RetryPolicy::NONE,
    job_retry: RetryPolicy::NONE,
    default_schedule: "0 0 15 * * *",
};

pub static INVENTORY_ADJUSTMENTS: ResourceDescriptor = ResourceDescriptor {
    name: "inventory_adjustments",
    endpoint: "/inventoryadjustments",
    array_key: "inventory_adjustments",
    id_field: "inventory_adjustment_id",
    table: "zoho_nigeria_inventory.inventory_adjustments",
    columns: columns![
        status: Text,
        adjustment_type: Text,
        date: Date,
        reason: Text,
        description: Text,
        total: Float,
        created_time: Timestamp,
        last_modified_time: Timestamp,
        item_id: Text,
        name: Text,
        quantity_adjusted: Float,
        value_adjusted: Float,
        custom_fields: Json,
        custom_field_hash: Text,
        cf_spareparts_number: Text,
        cf_spareparts_number_unformatted: Text,
        cf_customer_name: Text,
        cf_customer_name_unformatted: Text,
        cf_contact_person: Text,
        cf_contact_person_unformatted: Text,
        cf_customer_address: Text,
        cf_customer_address_unformatted: Text,
        reference_number: Text,
        created_by_id: Text,
        created_by_name: Text,
        last_modified_by_id: Text,
        last_modified_by_name: Text,
        warehouse_id: Text,
        warehouse_name: Text,
    ],
    params: &[],
    optional_params: &[],
    page_retry: RetryPolicy::NONE,
    job_retry: RetryPolicy::NONE,
    default_schedule: "0 0 16 * * *",
};

pub static CUSTOMERS: ResourceDescriptor = ResourceDescriptor {
    name: "customers",
    endpoint: "/contacts",
    array_key: "contacts",
    id_field: "contact_id",
    table: "zoho_nigeria_sales.customers",
    columns: columns![
        contact_name: Text,
        customer_name: Text,
        vendor_name: Text,
        contact_number: Text,
        company_name: Text,
        website: Text,
        language_code: Text,
        language_code_formatted: Text,
        contact_type: Text,
        contact_type_formatted: Text,
        status: Text,
        customer_sub_type: Text,
        source: Text,
        is_linked_with_zohocrm: Boolean,
        payment_terms: Text,
        payment_terms_label: Text,
        currency_id: Text,
        twitter: Text,
        facebook: Text,
        currency_code: Text,
        outstanding_receivable_amount: Float,
        outstanding_receivable_amount_bcy: Float,
        outstanding_payable_amount: Float,
        outstanding_payable_amount_bcy: Float,
        unused_credits_receivable_amount: Float,
        unused_credits_receivable_amount_bcy: Float,
        unused_credits_payable_amount: Float,
        unused_credits_payable_amount_bcy: Float,
        first_name: Text,
        last_name: Text,
        email: Text,
        phone: Text,
        mobile: Text,
        portal_status: Text,
        portal_status_formatted: Text,
        created_time: Timestamp,
        created_time_formatted: Text,
        last_modified_time: Timestamp,
        last_modified_time_formatted: Text,
        custom_fields: Json,
        custom_field_hash: Json,
        tags: Json,
        ach_supported: Boolean,
        has_attachment: Boolean,
        non_default_currency_values: Json,
    ],
    params: &[],
    optional_params: &[],
    page_retry: RetryPolicy::NONE,
    job_retry: RetryPolicy::NONE,
    default_schedule: "0 0 17 * * *",
};

pub static INVOICES: ResourceDescriptor = ResourceDescriptor {
    name: "invoices",
    endpoint: "/invoices",
    array_key: "invoices",
    id_field: "invoice_id",
    table: "zoho_nigeria_sales.invoices",
    columns: columns![
        invoice_number: Text,
        zcrm_potential_id: Text,
        location_id: Text,
        branch_id: Text,
        zcrm_potential_name: Text,
        customer_name: Text,
        company_name: Text,
        email: Text,
        phone: Text,
        salesperson_name: Text,
        salesperson_id: Text,
        billing_address: Json,
        shipping_address: Json,
        country: Text,
        total: Float,
        balance: Float,
        shipping_charge: Float,
        adjustment: Float,
        write_off_amount: Float,
        exchange_rate: Float,
        unprocessed_payment_amount: Float,
        status: Text,
        date: Date,
        due_date: Date,
        due_days: Integer,
        payment_expected_date: Timestamp,
        created_time: Timestamp,
        last_modified_time: Timestamp,
        updated_time: Timestamp,
        last_payment_date: Timestamp,
        ach_payment_initiated: Boolean,
        is_viewed_by_client: Boolean,
        has_attachment: Boolean,
        client_viewed_time: Timestamp,
        is_emailed: Boolean,
        color_code: Text,
        currency_id: Text,
        currency_code: Text,
        currency_symbol: Text,
        template_type: Text,
        no_of_copies: Integer,
        show_no_of_copies: Boolean,
        template_id: Text,
        documents: Json,
        reference_number: Text,
        branch_name: Text,
        created_by: Text,
        current_sub_status_id: Text,
        current_sub_status: Text,
        schedule_time: Timestamp,
        transaction_type: Text,
        reminders_sent: Integer,
        last_reminder_sent_date: Timestamp,
        custom_fields: Json,
        custom_field_hash: Json,
        cf_warrant_claim_request: Text,
        cf_warrant_claim_request_unformatted: Text,
        cf_installment_in_months: Text,
        cf_installment_in_months_unformatted: Text,
        cf_delivery_details: Text,
        cf_delivery_details_unformatted: Text,
        cf_acknowledge_application_for: Text,
        cf_acknowledge_application_for_unformatted: Text,
        cf_acknowledge_application_for_1: Text,
        cf_acknowledge_application_for_1_unformatted: Text,
        cf_business_units: Text,
        cf_business_units_unformatted: Text,
        tags: Json,
    ],
    params: &[],
    optional_params: &[],
    page_retry: RetryPolicy::NONE,
    job_retry: RetryPolicy::NONE,
    default_schedule: "0 0 18 * * *",
};

pub static PACKAGES: ResourceDescriptor = ResourceDescriptor {
    name: "packages",
    endpoint: "/packages",
    array_key: "packages",
    id_field: "package_id",
    table: "zoho_nigeria_sales.packages",
    columns: columns![
        package_number: Text,
        shipment_id: Text,
        customer_name: Text,
        status: Text,
        tracking_number: Text,
        is_tracking_enabled: Boolean,
        shipment_type: Text,
        shipping_charge: Float,
        quantity: Float,
        date: Timestamp,
        created_time: Timestamp,
        last_modified_time: Timestamp,
        shipment_date: Timestamp,
        salesorder_number: Text,
        sales_channel: Text,
        delivery_method: Text,
        is_carrier_shipment: Boolean,
        label_format: Text,
        custom_fields: Json,
        tags: Json,
    ],
    params: &[],
    optional_params: &[("sort_column", "last_modified_time"), ("sort_order", "D")],
    page_retry: RetryPolicy::NONE,
    job_retry: RetryPolicy::NONE,
    default_schedule: "0 0 19 * * *",
};

pub static PICKLISTS: ResourceDescriptor = ResourceDescriptor {
    name: "picklists",
    endpoint: "/picklists",
    array_key: "picklists",
    id_field: "picklist_id",
    table: "zoho_nigeria_sales.picklists",
    columns: columns![
        picklist_number: Text,
        date: Timestamp,
        created_time: Timestamp,
        last_modified_time: Timestamp,
        assignee_id: Text,
        assignee_name: Text,
        warehouse_id: Text,
        warehouse_name: Text,
        status: Text,
        notes: Text,
        custom_fields: Json,
        tags: Json,
        has_attachment: Boolean,
        status_formatted: Text,
        date_formatted: Text,
    ],
    params: &[],
    optional_params: &[],
    page_retry: RetryPolicy::NONE,
    job_retry: RetryPolicy::NONE,
    default_schedule: "0 0 23 * * *",
};

pub static SALES_ORDERS: ResourceDescriptor = ResourceDescriptor {
    name: "sales_orders",
    endpoint: "/salesorders",
    array_key: "salesorders",
    id_field: "salesorder_id",
    table: "zoho_nigeria_sales.sales_orders",
    columns: columns![
        zcrm_potential_id: Text,
        zcrm_potential_name: Text,
        customer_name: Text,
        customer_id: Text,
        email: Text,
        delivery_date: Timestamp,
        company_name: Text,
        color_code: Text,
        current_sub_status_id: Text,
        current_sub_status: Text,
        pickup_location_id: Text,
        salesorder_number: Text,
        reference_number: Text,
        date: Timestamp,
        shipment_date: Timestamp,
        shipment_days: Integer,
        due_by_days: Integer,
        due_in_days: Integer,
        currency_id: Text,
        source: Text,
        currency_code: Text,
        total: Float,
        bcy_total: Float,
        total_invoiced_amount: Float,
        balance: Float,
        created_time: Timestamp,
        last_modified_time: Timestamp,
        is_emailed: Boolean,
        is_viewed_in_mail: Boolean,
        mail_first_viewed_time: Timestamp,
        mail_last_viewed_time: Timestamp,
        quantity: Float,
        quantity_invoiced: Float,
        quantity_packed: Float,
        quantity_shipped: Float,
        order_status: Text,
        invoiced_status: Text,
        paid_status: Text,
        shipped_status: Text,
        status: Text,
        order_fulfillment_type: Text,
        is_drop_shipment: Boolean,
        is_backorder: Boolean,
        is_manually_fulfilled: Boolean,
        is_scheduled_for_quick_shipment_create: Boolean,
        sales_channel: Text,
        sales_channel_formatted: Text,
        salesperson_name: Text,
        branch_id: Text,
        branch_name: Text,
        location_id: Text,
        delivery_method: Text,
        delivery_method_id: Text,
        has_attachment: Boolean,
        tags: Json,
        cf_installment_in_months: Text,
        cf_installment_in_months_unformatted: Text,
        cf_business_units: Text,
        cf_business_units_unformatted: Text,
        cf_delivery_details: Text,
        cf_delivery_details_unformatted: Text,
        cf_acknowledge_application_for: Text,
        cf_acknowledge_application_for_unformatted: Text,
        cf_acknowledge_application_for_1: Text,
        cf_acknowledge_application_for_1_unformatted: Text,
        cf_product_type: Text,
        cf_product_type_unformatted: Text,
        cf_actual_sales_order_date: Text,
        cf_actual_sales_order_date_unformatted: Text,
        cf_package_detail: Text,
        cf_package_detail_unformatted: Text,
        custom_fields: Json,
        line_items: Json,
    ],
    params: &[],
    optional_params: &[("include", "line_items")],
    page_retry: SALES_ORDER_RETRY,
    job_retry: SALES_ORDER_RETRY,
    default_schedule: "0 0 21 * * *",
};

pub static PURCHASE_ORDERS: ResourceDescriptor = ResourceDescriptor {
    name: "purchase_orders",
    endpoint: "/purchaseorders",
    array_key: "purchaseorders",
    id_field: "purchaseorder_id",
    table: "zoho_nigeria_purchases.purchase_orders",
    columns: columns![
        vendor_id: Text,
        vendor_name: Text,
        company_name: Text,
        order_status: Text,
        billed_status: Text,
        received_status: Text,
        status: Text,
        color_code: Text,
        current_sub_status_id: Text,
        current_sub_status: Text,
        purchaseorder_number: Text,
        reference_number: Text,
        date: Timestamp,
        delivery_date: Timestamp,
        expected_delivery_date: Timestamp,
        delivery_days: Integer,
        due_by_days: Integer,
        due_in_days: Integer,
        currency_id: Text,
        currency_code: Text,
        price_precision: Integer,
        total: Float,
        has_attachment: Boolean,
        tags: Json,
        created_time: Timestamp,
        last_modified_time: Timestamp,
        is_drop_shipment: Boolean,
        total_ordered_quantity: Float,
        quantity_yet_to_receive: Float,
        quantity_marked_as_received: Float,
        is_po_marked_as_received: Boolean,
        is_backorder: Boolean,
        receives: Text,
        client_viewed_time: Timestamp,
        is_viewed_by_client: Boolean,
        branch_id: Text,
        branch_name: Text,
        location_id: Text,
    ],
    params: &[],
    optional_params: &[],
    page_retry: RetryPolicy::NONE,
    job_retry: RetryPolicy::NONE,
    default_schedule: "0 44 15 * * *",
};

pub static VENDORS: ResourceDescriptor = ResourceDescriptor {
    name: "vendors",
    endpoint: "/contacts",
    array_key: "contacts",
    id_field: "contact_id",
    table: "zoho_nigeria_purchases.vendors",
    columns: columns![
        contact_name: Text,
        company_name: Text,
        vendor_name: Text,
        contact_type: Text,
        status: Text,
        first_name: Text,
        last_name: Text,
        email: Text,
        phone: Text,
        mobile: Text,
        website: Text,
        currency_id: Text,
        currency_code: Text,
        payment_terms: Text,
        payment_terms_label: Text,
        outstanding_payable_amount: Float,
        outstanding_payable_amount_bcy: Float,
        unused_credits_payable_amount: Float,
        source: Text,
        is_linked_with_zohocrm: Boolean,
        has_attachment: Boolean,
        custom_fields: Json,
        tags: Json,
        created_time: Timestamp,
        last_modified_time: Timestamp,
    ],
    params: &[("contact_type", "vendor")],
    optional_params: &[],
    page_retry: RetryPolicy::NONE,
    job_retry: RetryPolicy::NONE,
    default_schedule: "0 22 12 * * *",
};

/// Every synced resource, in schedule order.
pub static ALL: [&ResourceDescriptor; 11] = [
    &ITEMS,
    &COMPOSITE_ITEMS,
    &PRICE_LISTS,
    &INVENTORY_ADJUSTMENTS,
    &CUSTOMERS,
    &INVOICES,
    &PACKAGES,
    &PICKLISTS,
    &SALES_ORDERS,
    &PURCHASE_ORDERS,
    &VENDORS,
];

/// Find a resource by its route name.
#[must_use]
pub fn by_name(name: &str) -> Option<&'static ResourceDescriptor> {
    ALL.iter().copied().find(|r| r.name == name)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_only_packages_and_sales_orders_send_optional_params() {
        let with_params: Vec<_> = ALL
            .iter()
            .filter(|r| !r.optional_params.is_empty())
            .map(|r| r.name)
            .collect();
        assert_eq!(with_params, ["packages", "sales_orders"]);
        assert!(PICKLISTS.optional_params.is_empty());
    }

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = ALL.iter().map(|r| r.name).collect();
        assert_eq!(names.len(), ALL.len());
        let tables: HashSet<_> = ALL.iter().map(|r| r.table).collect();
        assert_eq!(tables.len(), ALL.len());
    }

    #[test]
    fn test_columns_exclude_id_and_are_unique() {
        for resource in ALL {
            assert!(
                resource.column(resource.id_field).is_none(),
                "{} lists its external id as a column",
                resource.name
            );
            let names: HashSet<_> = resource.columns.iter().map(|c| c.name).collect();
            assert_eq!(names.len(), resource.columns.len(), "{}", resource.name);
        }
    }

    #[test]
    fn test_by_name() {
        assert_eq!(by_name("vendors").map(|r| r.endpoint), Some("/contacts"));
        assert_eq!(
            by_name("composite_items").map(|r| r.id_field),
            Some("composite_item_id")
        );
        assert!(by_name("widgets").is_none());
    }

    #[test]
    fn test_only_sales_orders_retry() {
        for resource in ALL {
            let retries = resource.job_retry.attempts > 1;
            assert_eq!(retries, resource.name == "sales_orders", "{}", resource.name);
        }
    }

    #[test]
    fn test_invoice_dates_are_date_columns() {
        assert_eq!(INVOICES.column("date").map(|c| c.ty), Some(ColumnType::Date));
        assert_eq!(
            INVOICES.column("due_date").map(|c| c.ty),
            Some(ColumnType::Date)
        );
    }
}
