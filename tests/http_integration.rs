//! Integration tests for the Query HTTP transport using wiremock
//!
//! These tests drive the real `HttpTransport` and the resource adapters
//! against mocked endpoints: form encoding, XML decoding, provider error
//! bodies and multi-page continuation flows.

use cloudq::error::ErrorClass;
use cloudq::provider::{Endpoints, HttpTransport, QueryClient, RequestContext};
use cloudq::query::FanOutExecutor;
use cloudq::resource::keypairs::KeypairAdapter;
use cloudq::resource::monitoring::MonitoringAdapter;
use cloudq::resource::volumes::VolumeAdapter;
use cloudq::resource::{CloudAdapter, MetricFilter, VolumeFilter};
use cloudq::query::WaitPolicy;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> QueryClient {
    let base = url::Url::parse(&server.uri()).unwrap();
    let transport = HttpTransport::new(Endpoints::Override(base)).unwrap();
    QueryClient::new(Arc::new(transport), RequestContext::new("us-east-1", "123456789012"))
}

fn xml(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/xml")
}

fn ec2_error(status: u16, code: &str, message: &str) -> ResponseTemplate {
    let body = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <Response><Errors><Error><Code>{}</Code><Message>{}</Message></Error></Errors>\
         <RequestID>ea966190-f9aa-478e-9ede-example</RequestID></Response>",
        code, message
    );
    ResponseTemplate::new(status).set_body_raw(body, "text/xml")
}

/// Test module for volume flows
mod volume_tests {
    use super::*;

    /// Test listing follows nextToken across pages and keeps page order
    #[tokio::test]
    async fn test_list_follows_continuation_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/ec2/"))
            .and(body_string_contains("NextToken=page2"))
            .respond_with(xml(
                "<DescribeVolumesResponse><volumeSet>\
                 <item><volumeId>vol-3</volumeId><size>30</size><status>in-use</status></item>\
                 </volumeSet></DescribeVolumesResponse>",
            ))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/ec2/"))
            .and(body_string_contains("Action=DescribeVolumes&Version=2014-06-15"))
            .respond_with(xml(
                "<DescribeVolumesResponse><volumeSet>\
                 <item><volumeId>vol-1</volumeId><size>10</size><status>available</status></item>\
                 <item><volumeId>vol-2</volumeId><size>20</size><status>creating</status></item>\
                 </volumeSet><nextToken>page2</nextToken></DescribeVolumesResponse>",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let volumes = VolumeAdapter::new(client_for(&server)).list(None).await.unwrap();
        let ids: Vec<&str> = volumes.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["vol-1", "vol-2", "vol-3"]);
        assert_eq!(volumes[2].size_gb, Some(30));
    }

    /// Test wire filters are form-encoded in order
    #[tokio::test]
    async fn test_filters_are_form_encoded() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/ec2/"))
            .and(body_string_contains(
                "Filter.1.Name=tag%3Aenv&Filter.1.Value.1=prod&Filter.2.Name=availability-zone",
            ))
            .respond_with(xml("<DescribeVolumesResponse><volumeSet/></DescribeVolumesResponse>"))
            .expect(1)
            .mount(&server)
            .await;

        let filter = VolumeFilter::new().with_tag("env", "prod").in_data_center("us-east-1a");
        let volumes = VolumeAdapter::new(client_for(&server))
            .list(Some(&filter))
            .await
            .unwrap();
        assert!(volumes.is_empty());
    }

    /// Test a not-found error body on get yields absence
    #[tokio::test]
    async fn test_not_found_body_is_absent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ec2_error(400, "InvalidVolume.NotFound", "The volume 'vol-x' does not exist."))
            .mount(&server)
            .await;

        let found = VolumeAdapter::new(client_for(&server)).get("vol-x").await.unwrap();
        assert!(found.is_none());
    }

    /// Test a rejected id on delete is an error, not a silent success
    #[tokio::test]
    async fn test_invalid_id_on_remove_is_fatal() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_string_contains("Action=DeleteVolume"))
            .respond_with(ec2_error(
                400,
                "InvalidParameterValue",
                "Value (not-a-volume) for parameter volumeId is invalid.",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let err = VolumeAdapter::new(client_for(&server))
            .remove("not-a-volume")
            .await
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Fatal);
        assert_eq!(err.code(), Some("InvalidParameterValue"));
    }

    /// Test a false acknowledgment is reported as a denial
    #[tokio::test]
    async fn test_false_return_is_denied() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_string_contains("Action=DetachVolume"))
            .respond_with(xml("<DetachVolumeResponse><return>false</return></DetachVolumeResponse>"))
            .mount(&server)
            .await;

        let err = VolumeAdapter::new(client_for(&server))
            .detach("vol-1", true)
            .await
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Denied);
        assert!(err.to_string().contains("Volume.detach vol-1"));
    }

    /// Test server faults are transient and carry the provider code
    #[tokio::test]
    async fn test_503_is_transient() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ec2_error(503, "Unavailable", "The server is overloaded"))
            .mount(&server)
            .await;

        let err = VolumeAdapter::new(client_for(&server)).list(None).await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Transient);
        assert_eq!(err.code(), Some("Unavailable"));
    }

    /// Test an undecodable success body is fatal
    #[tokio::test]
    async fn test_malformed_body_is_fatal() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<DescribeVolumesResponse><volumeSet>"))
            .mount(&server)
            .await;

        let err = VolumeAdapter::new(client_for(&server)).list(None).await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Fatal);
        assert_eq!(err.code(), Some("MalformedResponse"));
    }

    /// Test create sends the volume then tags it
    #[tokio::test]
    async fn test_create_then_tag() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_string_contains("Action=CreateVolume"))
            .and(body_string_contains("Size=8&AvailabilityZone=us-east-1a"))
            .respond_with(xml("<CreateVolumeResponse><volumeId>vol-9</volumeId></CreateVolumeResponse>"))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(body_string_contains("Action=CreateTags"))
            .and(body_string_contains("ResourceId.1=vol-9&Tag.1.Key=Name&Tag.1.Value=data"))
            .respond_with(xml("<CreateTagsResponse><return>true</return></CreateTagsResponse>"))
            .expect(1)
            .mount(&server)
            .await;

        let options = cloudq::resource::volumes::VolumeCreateOptions::new("data", "scratch", 8).in_data_center("us-east-1a");
        let id = VolumeAdapter::new(client_for(&server)).create(&options).await.unwrap();
        assert_eq!(id, "vol-9");
    }
}

/// Test module for monitoring flows
mod monitoring_tests {
    use super::*;

    /// Test monitoring calls reach the monitoring endpoint with its version
    #[tokio::test]
    async fn test_metrics_use_monitoring_endpoint() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/monitoring/"))
            .and(body_string_contains("Action=ListMetrics&Version=2010-08-01&Namespace=AWS%2FEC2"))
            .respond_with(xml(
                "<ListMetricsResponse xmlns=\"http://monitoring.amazonaws.com/doc/2010-08-01/\">\
                 <ListMetricsResult><Metrics><member>\
                 <Dimensions><member><Name>InstanceId</Name><Value>i-1</Value></member></Dimensions>\
                 <MetricName>CPUUtilization</MetricName><Namespace>AWS/EC2</Namespace>\
                 </member></Metrics></ListMetricsResult></ListMetricsResponse>",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let metrics = MonitoringAdapter::new(client_for(&server))
            .list_metrics(Some(&MetricFilter::new().in_namespace("AWS/EC2")))
            .await
            .unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].dimensions["InstanceId"], "i-1");
    }

    /// Test the CloudWatch error shape is understood
    #[tokio::test]
    async fn test_cloudwatch_error_shape() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/monitoring/"))
            .respond_with(ResponseTemplate::new(403).set_body_raw(
                "<ErrorResponse><Error><Type>Sender</Type><Code>AccessDenied</Code>\
                 <Message>User is not authorized</Message></Error><RequestId>r-1</RequestId></ErrorResponse>",
                "text/xml",
            ))
            .mount(&server)
            .await;

        let err = MonitoringAdapter::new(client_for(&server))
            .list_alarms(None)
            .await
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Denied);
        assert_eq!(err.code(), Some("AccessDenied"));
    }
}

/// Test module for transport failures and fan-out
mod transport_tests {
    use super::*;

    /// Test an unreachable endpoint surfaces as a transient failure
    #[tokio::test]
    async fn test_connection_failure_is_transient() {
        let transport = HttpTransport::new(Endpoints::Override(url::Url::parse("http://127.0.0.1:1/").unwrap())).unwrap();
        let client = QueryClient::new(Arc::new(transport), RequestContext::new("us-east-1", "1"));

        let err = KeypairAdapter::new(client).list(None).await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Transient);
        assert_eq!(err.code(), Some("RequestFailed"));
    }

    /// Test the inventory fans out over both services
    #[tokio::test]
    async fn test_inventory_over_http() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_string_contains("Action=DescribeVolumes"))
            .respond_with(xml("<R><volumeSet><item><volumeId>vol-1</volumeId></item></volumeSet></R>"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("Action=DescribeAddresses"))
            .respond_with(xml("<R><addressesSet/></R>"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("Action=DescribeKeyPairs"))
            .respond_with(xml("<R><keySet><item><keyName>k</keyName><keyFingerprint>f</keyFingerprint></item></keySet></R>"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/monitoring/"))
            .and(body_string_contains("Action=DescribeAlarms"))
            .respond_with(xml("<R><MetricAlarms/></R>"))
            .mount(&server)
            .await;

        let adapter = CloudAdapter::new(client_for(&server), FanOutExecutor::new(4), WaitPolicy::default());
        let inventory = adapter.inventory().await.unwrap();
        let ids: Vec<&str> = inventory.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["vol-1", "k"]);
    }
}
