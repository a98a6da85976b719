// Filesystem adapters for the app ports

pub mod csv_output_adapter;
pub mod degradation_report_adapter;
pub mod files;
pub mod summary_output_adapter;
pub mod xml_output_adapter;

pub use csv_output_adapter::CsvTableOutputAdapter;
pub use degradation_report_adapter::FileDegradationReportAdapter;
pub use summary_output_adapter::JsonSummaryOutputAdapter;
pub use xml_output_adapter::XmlTreeOutputAdapter;
