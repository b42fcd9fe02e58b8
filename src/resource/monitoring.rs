//! Metric alarm and metric adapter

use super::adapter::{KindSpec, ResourceAdapter};
use super::decode::monitoring;
use super::filter::{AlarmFilter, FilterOptions, MetricFilter};
use super::model::{Alarm, AlarmState, Metric, ResourceStatus, Tags};
use super::registry::{Operation, ResourceKind};
use crate::error::{CallStyle, Result};
use crate::provider::QueryClient;
use futures::Stream;

/// Arguments of [`MonitoringAdapter::update_alarm`]
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmUpdateOptions {
    pub name: String,
    pub description: Option<String>,
    pub namespace: String,
    pub metric_name: String,
    pub statistic: String,
    pub comparison_operator: String,
    pub threshold: f64,
    pub period: u32,
    pub evaluation_periods: u32,
    pub actions_enabled: bool,
    pub ok_actions: Vec<String>,
    pub alarm_actions: Vec<String>,
    pub insufficient_data_actions: Vec<String>,
    pub dimensions: Tags,
}

impl AlarmUpdateOptions {
    pub fn new(name: &str, namespace: &str, metric_name: &str, statistic: &str, comparison_operator: &str, threshold: f64) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            namespace: namespace.to_string(),
            metric_name: metric_name.to_string(),
            statistic: statistic.to_string(),
            comparison_operator: comparison_operator.to_string(),
            threshold,
            period: 60,
            evaluation_periods: 1,
            actions_enabled: true,
            ok_actions: Vec::new(),
            alarm_actions: Vec::new(),
            insufficient_data_actions: Vec::new(),
            dimensions: Tags::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_evaluation(mut self, period: u32, evaluation_periods: u32) -> Self {
        self.period = period;
        self.evaluation_periods = evaluation_periods;
        self
    }

    pub fn with_dimension(mut self, name: &str, value: &str) -> Self {
        self.dimensions.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_alarm_action(mut self, action: &str) -> Self {
        self.alarm_actions.push(action.to_string());
        self
    }

    pub fn with_ok_action(mut self, action: &str) -> Self {
        self.ok_actions.push(action.to_string());
        self
    }

    pub fn with_insufficient_data_action(mut self, action: &str) -> Self {
        self.insufficient_data_actions.push(action.to_string());
        self
    }

    pub fn actions_enabled(mut self, enabled: bool) -> Self {
        self.actions_enabled = enabled;
        self
    }
}

#[derive(Clone)]
pub struct MonitoringAdapter {
    alarms: ResourceAdapter<Alarm>,
    metrics: ResourceAdapter<Metric>,
}

impl MonitoringAdapter {
    pub fn new(client: QueryClient) -> Self {
        Self {
            alarms: ResourceAdapter::new(
                client.clone(),
                KindSpec {
                    kind: ResourceKind::Alarm,
                    decode: monitoring::decode_alarm,
                },
            ),
            metrics: ResourceAdapter::new(
                client,
                KindSpec {
                    kind: ResourceKind::Metric,
                    decode: monitoring::decode_metric,
                },
            ),
        }
    }

    // ========================================================================
    // Alarms
    // ========================================================================

    /// Create or replace an alarm
    pub async fn update_alarm(&self, options: &AlarmUpdateOptions) -> Result<()> {
        let request = self
            .alarms
            .request(Operation::Update)?
            .param("AlarmName", &options.name)
            .opt_param("AlarmDescription", options.description.as_deref())
            .param("Namespace", &options.namespace)
            .param("MetricName", &options.metric_name)
            .param("Statistic", &options.statistic)
            .param("ComparisonOperator", &options.comparison_operator)
            .param("Threshold", options.threshold)
            .param("Period", options.period)
            .param("EvaluationPeriods", options.evaluation_periods)
            .param("ActionsEnabled", options.actions_enabled)
            .indexed("OKActions.member", &options.ok_actions)
            .indexed("AlarmActions.member", &options.alarm_actions)
            .indexed("InsufficientDataActions.member", &options.insufficient_data_actions)
            .dimensions(options.dimensions.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .build();
        self.alarms
            .execute(Operation::Update, CallStyle::Create, &options.name, request)
            .await
            .map(|_| ())
    }

    pub async fn remove_alarms(&self, names: &[&str]) -> Result<()> {
        self.alarm_names_call(Operation::Remove, CallStyle::Remove, names).await
    }

    pub async fn enable_alarm_actions(&self, names: &[&str]) -> Result<()> {
        self.alarm_names_call(Operation::Enable, CallStyle::Mutate, names).await
    }

    pub async fn disable_alarm_actions(&self, names: &[&str]) -> Result<()> {
        self.alarm_names_call(Operation::Disable, CallStyle::Mutate, names).await
    }

    async fn alarm_names_call(&self, op: Operation, style: CallStyle, names: &[&str]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        let request = self
            .alarms
            .request(op)?
            .indexed("AlarmNames.member", names)
            .build();
        self.alarms
            .execute(op, style, &names.join(","), request)
            .await
            .map(|_| ())
    }

    pub async fn get_alarm(&self, name: &str) -> Result<Option<Alarm>> {
        let request = self
            .alarms
            .request(Operation::Get)?
            .param("AlarmNames.member.1", name)
            .build();
        self.alarms.get(name, request, |a| a.name == name).await
    }

    pub async fn list_alarms(&self, filter: Option<&AlarmFilter>) -> Result<Vec<Alarm>> {
        let mut template = self.alarms.request(Operation::List)?;
        if let Some(filter) = filter {
            template = filter.apply_wire(template);
        }
        self.alarms.list(template.build(), filter).await
    }

    pub async fn list_alarm_status(&self) -> Result<Vec<ResourceStatus<AlarmState>>> {
        let template = self.alarms.request(Operation::List)?.build();
        self.alarms
            .paginate(Operation::List, template, monitoring::decode_alarm_status)
            .collect_all()
            .await
    }

    // ========================================================================
    // Metrics
    // ========================================================================

    pub async fn list_metrics(&self, filter: Option<&MetricFilter>) -> Result<Vec<Metric>> {
        let mut template = self.metrics.request(Operation::List)?;
        if let Some(filter) = filter {
            template = filter.apply_wire(template);
        }
        self.metrics.list(template.build(), filter).await
    }

    /// Lazy metric listing; a page is only requested once the previous
    /// one has been consumed
    pub fn metrics(&self, filter: Option<MetricFilter>) -> Result<impl Stream<Item = Result<Metric>>> {
        let mut template = self.metrics.request(Operation::List)?;
        if let Some(filter) = &filter {
            template = filter.apply_wire(template);
        }
        Ok(self.metrics.stream(template.build(), filter))
    }
}
