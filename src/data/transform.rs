//! Conversion of the internal metric model into OTLP protobuf messages.
//!
//! Transport is out of scope here; this module only maps snapshots onto the
//! generated `opentelemetry_proto` message types so any OTLP driver can
//! encode them.

use crate::core::{KeyValue, Value};
use crate::data::{
    HistogramDataPoint, Metric, MetricData, MetricsData, NumberDataPoint, NumberValue,
};
use opentelemetry_proto::tonic::common::v1 as proto_common;
use opentelemetry_proto::tonic::metrics::v1 as proto_metrics;
use opentelemetry_proto::tonic::resource::v1 as proto_resource;

/// Converts a full snapshot into the OTLP `MetricsData` message.
pub fn to_proto(data: &MetricsData) -> proto_metrics::MetricsData {
    proto_metrics::MetricsData {
        resource_metrics: data.resource_metrics.iter().map(resource_metrics).collect(),
    }
}

fn resource_metrics(rm: &crate::data::ResourceMetrics) -> proto_metrics::ResourceMetrics {
    proto_metrics::ResourceMetrics {
        resource: Some(proto_resource::Resource {
            attributes: rm.resource.attributes.iter().map(key_value).collect(),
            ..Default::default()
        }),
        scope_metrics: rm.scope_metrics.iter().map(scope_metrics).collect(),
        ..Default::default()
    }
}

fn scope_metrics(sm: &crate::data::ScopeMetrics) -> proto_metrics::ScopeMetrics {
    let schema_url = sm
        .scope
        .as_ref()
        .and_then(|s| s.schema_url.clone())
        .unwrap_or_default();
    proto_metrics::ScopeMetrics {
        scope: sm.scope.as_ref().map(|s| proto_common::InstrumentationScope {
            name: s.name.clone(),
            version: s.version.clone(),
            ..Default::default()
        }),
        metrics: sm.metrics.iter().map(metric).collect(),
        schema_url,
    }
}

fn metric(m: &Metric) -> proto_metrics::Metric {
    let data = match &m.data {
        MetricData::Sum(sum) => proto_metrics::metric::Data::Sum(proto_metrics::Sum {
            data_points: sum.data_points.iter().map(number_data_point).collect(),
            aggregation_temporality: sum.aggregation_temporality.wire_value(),
            is_monotonic: sum.is_monotonic,
        }),
        MetricData::Gauge(gauge) => proto_metrics::metric::Data::Gauge(proto_metrics::Gauge {
            data_points: gauge.data_points.iter().map(number_data_point).collect(),
        }),
        MetricData::Histogram(hist) => {
            proto_metrics::metric::Data::Histogram(proto_metrics::Histogram {
                data_points: hist.data_points.iter().map(histogram_data_point).collect(),
                aggregation_temporality: hist.aggregation_temporality.wire_value(),
            })
        },
    };

    proto_metrics::Metric {
        name: m.name.clone(),
        description: m.description.clone(),
        unit: m.unit.clone(),
        data: Some(data),
        ..Default::default()
    }
}

fn number_data_point(point: &NumberDataPoint) -> proto_metrics::NumberDataPoint {
    let value = match point.value {
        NumberValue::I64(v) => proto_metrics::number_data_point::Value::AsInt(v),
        NumberValue::F64(v) => proto_metrics::number_data_point::Value::AsDouble(v),
    };
    proto_metrics::NumberDataPoint {
        attributes: point.attributes.iter().map(key_value).collect(),
        time_unix_nano: point.time_unix_nano,
        value: Some(value),
        ..Default::default()
    }
}

fn histogram_data_point(point: &HistogramDataPoint) -> proto_metrics::HistogramDataPoint {
    proto_metrics::HistogramDataPoint {
        attributes: point.attributes.iter().map(key_value).collect(),
        time_unix_nano: point.time_unix_nano,
        count: point.count,
        sum: Some(point.sum),
        bucket_counts: point.bucket_counts.clone(),
        explicit_bounds: point.explicit_bounds.clone(),
        min: point.min,
        max: point.max,
        ..Default::default()
    }
}

fn key_value(kv: &KeyValue) -> proto_common::KeyValue {
    let value = match &kv.value {
        Value::Bool(v) => proto_common::any_value::Value::BoolValue(*v),
        Value::String(v) => proto_common::any_value::Value::StringValue(v.clone()),
        Value::I64(v) => proto_common::any_value::Value::IntValue(*v),
        Value::F64(v) => proto_common::any_value::Value::DoubleValue(*v),
    };
    proto_common::KeyValue {
        key: kv.key.clone(),
        value: Some(proto_common::AnyValue { value: Some(value) }),
    }
}
