//! Alarm (`MetricAlarms/member`) and metric (`Metrics/member`) decoders

use super::{apply_fields, flag, number, rfc3339_timestamp, tags, text, DecodeError, FieldHandler};
use crate::provider::RequestContext;
use crate::query::xml::ResponseNode;
use crate::resource::model::{Alarm, AlarmState, Metric, ResourceStatus, Tags};
use chrono::{DateTime, Utc};

#[derive(Debug, Default)]
struct AlarmDraft {
    arn: Option<String>,
    name: Option<String>,
    description: Option<String>,
    namespace: Option<String>,
    metric_name: Option<String>,
    dimensions: Tags,
    statistic: Option<String>,
    comparison_operator: Option<String>,
    threshold: Option<f64>,
    period: Option<u32>,
    evaluation_periods: Option<u32>,
    actions_enabled: bool,
    ok_actions: Vec<String>,
    alarm_actions: Vec<String>,
    insufficient_data_actions: Vec<String>,
    state: Option<AlarmState>,
    state_reason: Option<String>,
    state_reason_data: Option<String>,
    state_updated: Option<DateTime<Utc>>,
}

const ALARM_FIELDS: &[(&str, FieldHandler<AlarmDraft>)] = &[
    ("AlarmArn", |d, n| {
        d.arn = text(n);
        Ok(())
    }),
    ("AlarmName", |d, n| {
        d.name = text(n);
        Ok(())
    }),
    ("AlarmDescription", |d, n| {
        d.description = text(n);
        Ok(())
    }),
    ("Namespace", |d, n| {
        d.namespace = text(n);
        Ok(())
    }),
    ("MetricName", |d, n| {
        d.metric_name = text(n);
        Ok(())
    }),
    ("Dimensions", |d, n| {
        d.dimensions = tags::dimensions(n);
        Ok(())
    }),
    ("Statistic", |d, n| {
        d.statistic = text(n);
        Ok(())
    }),
    ("ComparisonOperator", |d, n| {
        d.comparison_operator = text(n);
        Ok(())
    }),
    ("Threshold", |d, n| {
        d.threshold = number(n)?;
        Ok(())
    }),
    ("Period", |d, n| {
        d.period = number(n)?;
        Ok(())
    }),
    ("EvaluationPeriods", |d, n| {
        d.evaluation_periods = number(n)?;
        Ok(())
    }),
    ("ActionsEnabled", |d, n| {
        d.actions_enabled = flag(n);
        Ok(())
    }),
    ("OKActions", |d, n| {
        d.ok_actions = tags::members(n);
        Ok(())
    }),
    ("AlarmActions", |d, n| {
        d.alarm_actions = tags::members(n);
        Ok(())
    }),
    ("InsufficientDataActions", |d, n| {
        d.insufficient_data_actions = tags::members(n);
        Ok(())
    }),
    ("StateValue", |d, n| {
        d.state = n.text().map(AlarmState::from_provider);
        Ok(())
    }),
    ("StateReason", |d, n| {
        d.state_reason = text(n);
        Ok(())
    }),
    ("StateReasonData", |d, n| {
        d.state_reason_data = text(n);
        Ok(())
    }),
    ("StateUpdatedTimestamp", |d, n| {
        d.state_updated = rfc3339_timestamp(n)?;
        Ok(())
    }),
];

/// Decode one alarm; the id is the ARN, falling back to the name
pub fn decode_alarm(node: &ResponseNode, context: &RequestContext) -> Result<Option<Alarm>, DecodeError> {
    let mut d = AlarmDraft::default();
    apply_fields(ALARM_FIELDS, &mut d, node)?;

    let Some(id) = d.arn.or_else(|| d.name.clone()) else {
        return Ok(None);
    };

    Ok(Some(Alarm {
        name: d.name.unwrap_or_else(|| id.clone()),
        id,
        region: context.region.clone(),
        description: d.description,
        namespace: d.namespace,
        metric_name: d.metric_name,
        dimensions: d.dimensions,
        statistic: d.statistic,
        comparison_operator: d.comparison_operator,
        threshold: d.threshold,
        period: d.period,
        evaluation_periods: d.evaluation_periods,
        actions_enabled: d.actions_enabled,
        ok_actions: d.ok_actions,
        alarm_actions: d.alarm_actions,
        insufficient_data_actions: d.insufficient_data_actions,
        state: d.state.unwrap_or(AlarmState::InsufficientData),
        state_reason: d.state_reason,
        state_reason_data: d.state_reason_data,
        state_updated: d.state_updated,
    }))
}

/// `(alarm name, state)`
pub fn decode_alarm_status(node: &ResponseNode, _context: &RequestContext) -> Result<Option<ResourceStatus<AlarmState>>, DecodeError> {
    let Some(name) = node.child_text("AlarmName") else {
        return Ok(None);
    };
    let state = node
        .child_text("StateValue")
        .map(AlarmState::from_provider)
        .unwrap_or(AlarmState::InsufficientData);
    Ok(Some(ResourceStatus::new(name, state)))
}

#[derive(Debug, Default)]
struct MetricDraft {
    name: Option<String>,
    namespace: Option<String>,
    dimensions: Tags,
}

const METRIC_FIELDS: &[(&str, FieldHandler<MetricDraft>)] = &[
    ("MetricName", |d, n| {
        d.name = text(n);
        Ok(())
    }),
    ("Namespace", |d, n| {
        d.namespace = text(n);
        Ok(())
    }),
    ("Dimensions", |d, n| {
        d.dimensions = tags::dimensions(n);
        Ok(())
    }),
];

/// `namespace:name{k=v,...}`; the name alone is not unique across
/// namespaces or dimension sets. Dimensions are already key-sorted.
fn metric_id(namespace: Option<&str>, name: &str, dimensions: &Tags) -> String {
    let mut id = match namespace {
        Some(ns) => format!("{}:{}", ns, name),
        None => name.to_string(),
    };
    if !dimensions.is_empty() {
        let pairs: Vec<String> = dimensions.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        id.push('{');
        id.push_str(&pairs.join(","));
        id.push('}');
    }
    id
}

pub fn decode_metric(node: &ResponseNode, context: &RequestContext) -> Result<Option<Metric>, DecodeError> {
    let mut d = MetricDraft::default();
    apply_fields(METRIC_FIELDS, &mut d, node)?;

    let Some(name) = d.name else {
        return Ok(None);
    };
    Ok(Some(Metric {
        id: metric_id(d.namespace.as_deref(), &name, &d.dimensions),
        name,
        namespace: d.namespace,
        region: context.region.clone(),
        dimensions: d.dimensions,
    }))
}
