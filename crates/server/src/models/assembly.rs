//! Assembly-line record types.
//!
//! Every local table has the same shape: a generated `uid`, a flat set of
//! business columns and `created_at`/`updated_at`. The [`assembly_resource!`]
//! macro generates the row, create and update types for one table and ties
//! them together through [`AssemblyResource`], which the generic repository
//! and router are written against.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;

use kool_data_hub_core::RecordUid;

/// A bindable column value produced from a create or update body.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(Option<String>),
    Float(Option<f64>),
    Timestamp(DateTime<Utc>),
}

/// A column type usable in an assembly table.
///
/// `Create` is the type accepted on insert; timestamps are optional there
/// and default to the insert time.
pub trait AssemblyField: Sized {
    type Create: DeserializeOwned + std::fmt::Debug + Clone + Send;

    fn create_value(input: Self::Create, now: DateTime<Utc>) -> FieldValue;

    fn into_value(self) -> FieldValue;
}

impl AssemblyField for String {
    type Create = Self;

    fn create_value(input: Self, _now: DateTime<Utc>) -> FieldValue {
        FieldValue::Text(Some(input))
    }

    fn into_value(self) -> FieldValue {
        FieldValue::Text(Some(self))
    }
}

impl AssemblyField for Option<String> {
    type Create = Self;

    fn create_value(input: Self, _now: DateTime<Utc>) -> FieldValue {
        FieldValue::Text(input)
    }

    fn into_value(self) -> FieldValue {
        FieldValue::Text(self)
    }
}

impl AssemblyField for f64 {
    type Create = Self;

    fn create_value(input: Self, _now: DateTime<Utc>) -> FieldValue {
        FieldValue::Float(Some(input))
    }

    fn into_value(self) -> FieldValue {
        FieldValue::Float(Some(self))
    }
}

impl AssemblyField for DateTime<Utc> {
    type Create = Option<Self>;

    fn create_value(input: Option<Self>, now: DateTime<Utc>) -> FieldValue {
        FieldValue::Timestamp(input.unwrap_or(now))
    }

    fn into_value(self) -> FieldValue {
        FieldValue::Timestamp(self)
    }
}

/// A locally managed table exposed through the generic CRUD router.
pub trait AssemblyResource: Send + Sync + 'static {
    /// Stored row, returned by every endpoint.
    type Record: for<'r> sqlx::FromRow<'r, PgRow> + Serialize + Send + Sync + Unpin + 'static;
    /// Create body; every required column must be present.
    type Create: DeserializeOwned + Send + 'static;
    /// PATCH body; absent or null fields are left unchanged.
    type Update: DeserializeOwned + Default + Send + 'static;

    /// Schema-qualified table name.
    const TABLE: &'static str;
    /// URL path segment under `/api/v1`.
    const COLLECTION: &'static str;
    /// Human-readable name used in error messages.
    const LABEL: &'static str;
    /// Column for the get-by-serial lookup, if the table has one.
    const SERIAL_COLUMN: Option<&'static str>;

    /// Column values for an insert, in declaration order.
    fn create_values(input: Self::Create, now: DateTime<Utc>) -> Vec<(&'static str, FieldValue)>;

    /// Column values present in a PATCH body.
    fn update_values(input: Self::Update) -> Vec<(&'static str, FieldValue)>;
}

/// Define an assembly table: marker type, row, create and update bodies.
macro_rules! assembly_resource {
    (
        $(#[$meta:meta])*
        $resource:ident {
            record: $record:ident,
            create: $create:ident,
            update: $update:ident,
            table: $table:literal,
            collection: $collection:literal,
            label: $label:literal,
            serial: $serial:expr,
            fields { $($field:ident: $ty:ty),+ $(,)? }
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $resource;

        #[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
        pub struct $record {
            pub uid: RecordUid,
            $(pub $field: $ty,)+
            pub created_at: DateTime<Utc>,
            pub updated_at: DateTime<Utc>,
        }

        #[derive(Debug, Clone, Deserialize)]
        pub struct $create {
            $(pub $field: <$ty as AssemblyField>::Create,)+
        }

        #[derive(Debug, Clone, Default, Deserialize)]
        #[serde(default)]
        pub struct $update {
            $(pub $field: Option<$ty>,)+
        }

        impl AssemblyResource for $resource {
            type Record = $record;
            type Create = $create;
            type Update = $update;

            const TABLE: &'static str = $table;
            const COLLECTION: &'static str = $collection;
            const LABEL: &'static str = $label;
            const SERIAL_COLUMN: Option<&'static str> = $serial;

            fn create_values(
                input: $create,
                now: DateTime<Utc>,
            ) -> Vec<(&'static str, FieldValue)> {
                vec![$((
                    stringify!($field),
                    <$ty as AssemblyField>::create_value(input.$field, now),
                )),+]
            }

            fn update_values(input: $update) -> Vec<(&'static str, FieldValue)> {
                let mut values = Vec::new();
                $(
                    if let Some(value) = input.$field {
                        values.push((stringify!($field), AssemblyField::into_value(value)));
                    }
                )+
                values
            }
        }
    };
}

const SERIAL: Option<&str> = Some("product_serial_number");

assembly_resource! {
    /// Battery dispatch and repair log.
    Battery {
        record: BatteryRecord,
        create: BatteryCreate,
        update: BatteryUpdate,
        table: "kool_assembly.battery",
        collection: "batteries",
        label: "Battery",
        serial: SERIAL,
        fields {
            customer_name: String,
            product_sku: String,
            product_serial_number: String,
            field_technician: String,
            condition: String,
            receiver: String,
            faulty_component: String,
            remedy: String,
            product_category_new_ref: String,
            date_sent_out: DateTime<Utc>,
        }
    }
}

assembly_resource! {
    /// Inverter releases and returns. Has no serial number column.
    Inverter {
        record: InverterRecord,
        create: InverterCreate,
        update: InverterUpdate,
        table: "kool_assembly.inverters",
        collection: "inverters",
        label: "Inverter",
        serial: None,
        fields {
            engineer_name: String,
            inverter_size: String,
            customer_name: String,
            release_date: DateTime<Utc>,
            return_inverter_id: Option<String>,
            return_date: DateTime<Utc>,
        }
    }
}

assembly_resource! {
    /// IoT unit fitting.
    Iot {
        record: IotRecord,
        create: IotCreate,
        update: IotUpdate,
        table: "kool_assembly.iot",
        collection: "iot",
        label: "IoT",
        serial: SERIAL,
        fields {
            product_sku: String,
            product_serial_number: String,
            device_name: String,
            unit_id: String,
            customer_name: String,
            product_category_new_ref: String,
            engineer_name: String,
            product_type: String,
            date_sent_out: DateTime<Utc>,
        }
    }
}

assembly_resource! {
    /// Pay-as-you-go device fitting.
    Paygo {
        record: PaygoRecord,
        create: PaygoCreate,
        update: PaygoUpdate,
        table: "kool_assembly.paygo",
        collection: "paygo",
        label: "Paygo",
        serial: SERIAL,
        fields {
            product_sku: String,
            air_conditioner: Option<String>,
            product_serial_number: String,
            paygo_id_kb_no: String,
            customer_name: String,
            paygo_or_usb: String,
            paygo_technician: String,
            assembly_remarks: String,
            date_sent_out: DateTime<Utc>,
        }
    }
}

assembly_resource! {
    /// Freezer production line checklist.
    Production {
        record: ProductionRecord,
        create: ProductionCreate,
        update: ProductionUpdate,
        table: "kool_assembly.production",
        collection: "production",
        label: "Production",
        serial: SERIAL,
        fields {
            product_sku: String,
            product_serial_number: String,
            comp_fixing: String,
            engineer_that_installed_compressor: String,
            comp_controller_connection: String,
            piping: String,
            brazing: String,
            vacumming: String,
            gas_charging: String,
            batching: String,
            leak_test: String,
            customer_name: String,
            packaging: String,
            drying: String,
            officer_that_passed_freezer: String,
            issue: String,
            product_category_new_ref: String,
            product_type: String,
            assembly_remarks: String,
            date_sent_out: DateTime<Utc>,
        }
    }
}

assembly_resource! {
    /// Quality-control results.
    Quality {
        record: QualityRecord,
        create: QualityCreate,
        update: QualityUpdate,
        table: "kool_assembly.quality",
        collection: "quality",
        label: "Quality",
        serial: SERIAL,
        fields {
            product_serial_number: String,
            product_sku: String,
            product_category_new_ref: String,
            performance: f64,
            accessories_checking: String,
            product_type: String,
            status: String,
            officer_that_passed_freezer: String,
            qc_remarks: String,
            date_sent_out: DateTime<Utc>,
        }
    }
}

assembly_resource! {
    /// Units brought into the warehouse.
    InventoryIn {
        record: InventoryInRecord,
        create: InventoryInCreate,
        update: InventoryInUpdate,
        table: "kool_assembly.inventory_in",
        collection: "inventory-in",
        label: "Inventory in",
        serial: SERIAL,
        fields {
            product_sku: String,
            product_serial_number: String,
            product_category_new_ref: String,
            product_type: String,
            brought_in_from: String,
            date_logged_out: DateTime<Utc>,
        }
    }
}

assembly_resource! {
    /// Units returned to the warehouse.
    InventoryReturn {
        record: InventoryReturnRecord,
        create: InventoryReturnCreate,
        update: InventoryReturnUpdate,
        table: "kool_assembly.inventory_return",
        collection: "inventory-return",
        label: "Inventory return",
        serial: SERIAL,
        fields {
            product_sku: String,
            product_serial_number: String,
            unit_received_by: String,
            status: String,
            released_to: String,
            product_type: String,
            date_sent_out: DateTime<Utc>,
        }
    }
}
