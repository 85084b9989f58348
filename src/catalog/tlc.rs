//! Built-in table definitions for the NYC TLC Athena database.

use super::TableSchema;

const TRIP_COLUMNS: &[&str] = &[
    "vendorid",
    "tpep_pickup_datetime",
    "tpep_dropoff_datetime",
    "passenger_count",
    "trip_distance",
    "ratecodeid",
    "store_and_fwd_flag",
    "pulocationid",
    "dolocationid",
    "payment_type",
    "fare_amount",
    "extra",
    "mta_tax",
    "tip_amount",
    "tolls_amount",
    "improvement_surcharge",
    "total_amount",
    "congestion_surcharge",
    "airport_fee",
    "type",
    "year",
    "month",
];

const ZONE_COLUMNS: &[&str] = &[
    "objectid",
    "shape_leng",
    "shape_area",
    "zone",
    "locationid",
    "borough",
    "geometry",
    "geometry_wkt",
];

pub(super) fn tables() -> Vec<TableSchema> {
    vec![
        TableSchema::new(
            "gtp_tlc_data",
            "Taxi trip data (right now just yellow and green taxis), including pickup/dropoff \
             locations, times, fares, and passenger counts",
            TRIP_COLUMNS.iter().copied(),
        ),
        TableSchema::new(
            "taxi_zones",
            "Taxi zone boundaries for location lookups and joins (includes geometry and WKT)",
            ZONE_COLUMNS.iter().copied(),
        ),
    ]
}
