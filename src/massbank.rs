//! Message shapes and registries for the MassBank spectrum-search API.
//!
//! One descriptor table per message replaces the generated per-message
//! stub classes. Shapes, the type registry and the fault registry are
//! built once on first use and are read-only afterwards, so they can
//! be shared freely across threads.
//!
//! Operation wrapper elements live in the service namespace
//! (`http://api.massbank`); the shared complex types live in
//! `http://api.massbank/xsd`.

use std::sync::{Arc, OnceLock};

use crate::error::BindError;
use crate::fault::FaultRegistry;
use crate::qname::QName;
use crate::shape::{MessageShape, ScalarKind};
use crate::types::TypeRegistry;
use crate::value::{Record, Value};

/// Service endpoint the operations are dispatched to.
pub const DEFAULT_ENDPOINT: &str = "http://www.massbank.jp/api/services/MassBankAPI";

/// Wire name of the service's fault detail element.
pub const FAULT_ELEMENT: &str = "MassBankAPIServiceException";

/// Typed fault raised by the MassBank service.
#[derive(Debug, thiserror::Error)]
pub enum MassBankFault {
    #[error("MassBank fault in {operation}: {message}")]
    Service { operation: String, message: String },
}

/// One WSDL operation: its request/response shapes and SOAP action.
pub struct Operation {
    pub name: &'static str,
    pub soap_action: &'static str,
    pub request: Arc<MessageShape>,
    pub response: Arc<MessageShape>,
}

/// The complete binding surface of the MassBank API.
pub struct Bindings {
    pub result: Arc<MessageShape>,
    pub record_info: Arc<MessageShape>,
    pub search_result: Arc<MessageShape>,
    pub peak: Arc<MessageShape>,
    pub job_status: Arc<MessageShape>,
    pub result_set: Arc<MessageShape>,
    pub fault_detail: Arc<MessageShape>,
    pub operations: Vec<Operation>,
    pub types: TypeRegistry,
    pub faults: FaultRegistry<MassBankFault>,
}

impl Bindings {
    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.name == name)
    }

    fn build() -> Self {
        let result = Arc::new(
            MessageShape::new(QName::types("Result"))
                .nillable_scalar("id", QName::types("id"), ScalarKind::String)
                .nillable_scalar("title", QName::types("title"), ScalarKind::String)
                .nillable_scalar("formula", QName::types("formula"), ScalarKind::String)
                .nillable_scalar("exactMass", QName::types("exactMass"), ScalarKind::String)
                .nillable_scalar("score", QName::types("score"), ScalarKind::String),
        );

        // Substitutes for Result via xsi:type in getRecordInfo
        // responses.
        let record_info = Arc::new(
            MessageShape::new(QName::types("RecordInfo"))
                .nillable_scalar("id", QName::types("id"), ScalarKind::String)
                .nillable_scalar("info", QName::types("info"), ScalarKind::String),
        );

        let search_result = Arc::new(
            MessageShape::new(QName::types("SearchResult"))
                .scalar("numResults", QName::types("numResults"), ScalarKind::Int)
                .complex_array("results", QName::types("results"), result.clone()),
        );

        let peak = Arc::new(
            MessageShape::new(QName::types("Peak"))
                .nillable_scalar("id", QName::types("id"), ScalarKind::String)
                .scalar_array("mzs", QName::types("mzs"), ScalarKind::Double)
                .scalar_array("intensities", QName::types("intensities"), ScalarKind::Double)
                .scalar("numPeaks", QName::types("numPeaks"), ScalarKind::Int),
        );

        let job_status = Arc::new(
            MessageShape::new(QName::types("JobStatus"))
                .nillable_scalar("status", QName::types("status"), ScalarKind::String)
                .scalar("statusCode", QName::types("statusCode"), ScalarKind::Int)
                .nillable_scalar("requestDate", QName::types("requestDate"), ScalarKind::String),
        );

        let result_set = Arc::new(
            MessageShape::new(QName::types("ResultSet"))
                .nillable_scalar("queryName", QName::types("queryName"), ScalarKind::String)
                .scalar("numResults", QName::types("numResults"), ScalarKind::Int)
                .complex_array("results", QName::types("results"), result.clone()),
        );

        let fault_detail = Arc::new(
            MessageShape::new(QName::service(FAULT_ELEMENT))
                .element(QName::service(FAULT_ELEMENT))
                .nillable_scalar("message", QName::service("message"), ScalarKind::String),
        );

        let operations = vec![
            Operation {
                name: "searchSpectrum",
                soap_action: "urn:searchSpectrum",
                request: Arc::new(
                    MessageShape::new(QName::service("searchSpectrum"))
                        .element(QName::service("searchSpectrum"))
                        .scalar_array("mzs", QName::service("mzs"), ScalarKind::String)
                        .scalar_array(
                            "intensities",
                            QName::service("intensities"),
                            ScalarKind::String,
                        )
                        .nillable_scalar("unit", QName::service("unit"), ScalarKind::String)
                        .nillable_scalar(
                            "tolerance",
                            QName::service("tolerance"),
                            ScalarKind::String,
                        )
                        .nillable_scalar("cutoff", QName::service("cutoff"), ScalarKind::String)
                        .scalar_array(
                            "instrumentTypes",
                            QName::service("instrumentTypes"),
                            ScalarKind::String,
                        )
                        .nillable_scalar("ionMode", QName::service("ionMode"), ScalarKind::String)
                        .scalar(
                            "maxNumResults",
                            QName::service("maxNumResults"),
                            ScalarKind::Int,
                        ),
                ),
                response: Arc::new(
                    MessageShape::new(QName::service("searchSpectrumResponse"))
                        .element(QName::service("searchSpectrumResponse"))
                        .complex("return", QName::service("return"), search_result.clone()),
                ),
            },
            Operation {
                name: "searchPeak",
                soap_action: "urn:searchPeak",
                request: Arc::new(
                    MessageShape::new(QName::service("searchPeak"))
                        .element(QName::service("searchPeak"))
                        .scalar_array("mzs", QName::service("mzs"), ScalarKind::String)
                        .nillable_scalar(
                            "relativeIntensity",
                            QName::service("relativeIntensity"),
                            ScalarKind::String,
                        )
                        .nillable_scalar(
                            "tolerance",
                            QName::service("tolerance"),
                            ScalarKind::String,
                        )
                        .scalar_array(
                            "instrumentTypes",
                            QName::service("instrumentTypes"),
                            ScalarKind::String,
                        )
                        .nillable_scalar("ionMode", QName::service("ionMode"), ScalarKind::String)
                        .scalar(
                            "maxNumResults",
                            QName::service("maxNumResults"),
                            ScalarKind::Int,
                        ),
                ),
                response: Arc::new(
                    MessageShape::new(QName::service("searchPeakResponse"))
                        .element(QName::service("searchPeakResponse"))
                        .complex("return", QName::service("return"), search_result.clone()),
                ),
            },
            Operation {
                name: "getInstrumentTypes",
                soap_action: "urn:getInstrumentTypes",
                request: Arc::new(
                    MessageShape::new(QName::service("getInstrumentTypes"))
                        .element(QName::service("getInstrumentTypes")),
                ),
                response: Arc::new(
                    MessageShape::new(QName::service("getInstrumentTypesResponse"))
                        .element(QName::service("getInstrumentTypesResponse"))
                        .scalar_array("return", QName::service("return"), ScalarKind::String),
                ),
            },
            Operation {
                name: "getRecordInfo",
                soap_action: "urn:getRecordInfo",
                request: Arc::new(
                    MessageShape::new(QName::service("getRecordInfo"))
                        .element(QName::service("getRecordInfo"))
                        .scalar_array("ids", QName::service("ids"), ScalarKind::String),
                ),
                response: Arc::new(
                    MessageShape::new(QName::service("getRecordInfoResponse"))
                        .element(QName::service("getRecordInfoResponse"))
                        .complex_array("return", QName::service("return"), record_info.clone()),
                ),
            },
            Operation {
                name: "getPeak",
                soap_action: "urn:getPeak",
                request: Arc::new(
                    MessageShape::new(QName::service("getPeak"))
                        .element(QName::service("getPeak"))
                        .scalar_array("ids", QName::service("ids"), ScalarKind::String)
                        .scalar(
                            "maxNumPeaks",
                            QName::service("maxNumPeaks"),
                            ScalarKind::Int,
                        ),
                ),
                response: Arc::new(
                    MessageShape::new(QName::service("getPeakResponse"))
                        .element(QName::service("getPeakResponse"))
                        .complex_array("return", QName::service("return"), peak.clone()),
                ),
            },
            Operation {
                name: "execBatchJob",
                soap_action: "urn:execBatchJob",
                request: Arc::new(
                    MessageShape::new(QName::service("execBatchJob"))
                        .element(QName::service("execBatchJob"))
                        .nillable_scalar("type", QName::service("type"), ScalarKind::String)
                        .nillable_scalar(
                            "mailAddress",
                            QName::service("mailAddress"),
                            ScalarKind::String,
                        )
                        .scalar_array(
                            "queryStrings",
                            QName::service("queryStrings"),
                            ScalarKind::String,
                        ),
                ),
                response: Arc::new(
                    MessageShape::new(QName::service("execBatchJobResponse"))
                        .element(QName::service("execBatchJobResponse"))
                        .nillable_scalar("return", QName::service("return"), ScalarKind::String),
                ),
            },
            Operation {
                name: "getJobStatus",
                soap_action: "urn:getJobStatus",
                request: Arc::new(
                    MessageShape::new(QName::service("getJobStatus"))
                        .element(QName::service("getJobStatus"))
                        .nillable_scalar("jobId", QName::service("jobId"), ScalarKind::String)
                        .required(),
                ),
                response: Arc::new(
                    MessageShape::new(QName::service("getJobStatusResponse"))
                        .element(QName::service("getJobStatusResponse"))
                        .complex("return", QName::service("return"), job_status.clone()),
                ),
            },
            Operation {
                name: "getJobResult",
                soap_action: "urn:getJobResult",
                request: Arc::new(
                    MessageShape::new(QName::service("getJobResult"))
                        .element(QName::service("getJobResult"))
                        .nillable_scalar("jobId", QName::service("jobId"), ScalarKind::String)
                        .required(),
                ),
                response: Arc::new(
                    MessageShape::new(QName::service("getJobResultResponse"))
                        .element(QName::service("getJobResultResponse"))
                        .complex_array("return", QName::service("return"), result_set.clone()),
                ),
            },
        ];

        let mut types = TypeRegistry::new();
        for shape in [
            &result,
            &record_info,
            &search_result,
            &peak,
            &job_status,
            &result_set,
        ] {
            types.register(shape.clone());
        }

        let mut faults = FaultRegistry::new();
        for op in &operations {
            let operation = op.name.to_string();
            faults.register(
                QName::service(FAULT_ELEMENT),
                op.name,
                fault_detail.clone(),
                move |detail| {
                    let message = detail
                        .get("message")
                        .ok()
                        .flatten()
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    Some(MassBankFault::Service {
                        operation: operation.clone(),
                        message,
                    })
                },
            );
        }

        Self {
            result,
            record_info,
            search_result,
            peak,
            job_status,
            result_set,
            fault_detail,
            operations,
            types,
            faults,
        }
    }
}

/// Process-wide binding tables, built on first use.
pub fn bindings() -> &'static Bindings {
    static BINDINGS: OnceLock<Bindings> = OnceLock::new();
    BINDINGS.get_or_init(Bindings::build)
}

/// Query parameters for the `searchSpectrum` operation, mirroring the
/// values the MassCascade search task supplies.
#[derive(Debug, Clone)]
pub struct SpectrumQuery {
    /// Peak m/z values, in spectrum order, in their lexical form.
    pub mzs: Vec<String>,
    /// Peak intensities normalized to the service's 0..1000 range.
    pub intensities: Vec<String>,
    /// Tolerance unit, `"ppm"` or `"unit"`.
    pub unit: String,
    pub tolerance: String,
    pub cutoff: String,
    pub instrument_types: Vec<String>,
    /// `"positive"`, `"negative"` or `"both"`.
    pub ion_mode: String,
    pub max_num_results: i32,
}

impl SpectrumQuery {
    /// Build the `searchSpectrum` request record.
    pub fn into_record(self) -> Result<Record, BindError> {
        let shape = match bindings().operation("searchSpectrum") {
            Some(op) => op.request.clone(),
            None => unreachable!("searchSpectrum is always registered"),
        };
        let mut rec = Record::new(shape);
        rec.set("mzs", Value::strings(self.mzs.into_iter().map(Some)))?;
        rec.set(
            "intensities",
            Value::strings(self.intensities.into_iter().map(Some)),
        )?;
        rec.set("unit", Value::string(&self.unit))?;
        rec.set("tolerance", Value::string(&self.tolerance))?;
        rec.set("cutoff", Value::string(&self.cutoff))?;
        rec.set(
            "instrumentTypes",
            Value::strings(self.instrument_types.into_iter().map(Some)),
        )?;
        rec.set("ionMode", Value::string(&self.ion_mode))?;
        rec.set("maxNumResults", Value::int(self.max_num_results))?;
        Ok(rec)
    }
}

/// Build the `getRecordInfo` request record for a set of record ids.
pub fn record_info_request<I, S>(ids: I) -> Result<Record, BindError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let shape = match bindings().operation("getRecordInfo") {
        Some(op) => op.request.clone(),
        None => unreachable!("getRecordInfo is always registered"),
    };
    let mut rec = Record::new(shape);
    rec.set(
        "ids",
        Value::strings(ids.into_iter().map(|s| Some(s.into()))),
    )?;
    Ok(rec)
}
