//! Smoke test for the facade re-exports: everything an application needs
//! should be reachable through `swarmlink::` paths alone.

use std::time::Duration;

use swarmlink::{
    signal_band, GribModel, GribRequest, LinkState, ModemBuilder, SignalBand, TextMessage,
};
use swarmlink_test_harness::{MockController, MockTransport};

async fn wait_for_sends(controller: &MockController, count: usize) -> Vec<String> {
    for _ in 0..100 {
        let sent = controller.sent_lines();
        if sent.len() >= count {
            return sent;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {count} sends, got {:?}", controller.sent_lines());
}

#[tokio::test]
async fn facade_drives_a_modem_end_to_end() {
    let mock = MockTransport::new();
    let controller = mock.controller();
    let modem = ModemBuilder::new()
        .build_with_transport(Box::new(mock))
        .unwrap();

    modem.init().await.unwrap();
    let sent = wait_for_sends(&controller, 6).await;
    assert_eq!(sent[0], "$CS*10");
    assert_eq!(modem.status().link.state, LinkState::Connected);

    modem
        .send_text_message(&TextMessage::new("skipper", "eta", "thursday 0900"))
        .await
        .unwrap();
    let sent = wait_for_sends(&controller, 7).await;
    assert!(sent[6].starts_with("$TD AI=37500,\""));

    modem
        .send_grib_request(&GribRequest::new(GribModel::Gfs))
        .await
        .unwrap();
    let sent = wait_for_sends(&controller, 8).await;
    assert!(sent[7].starts_with("$TD AI=37600,\"GFS:"));

    assert_eq!(signal_band(-95), Some(SignalBand::Marginal));

    modem.close().await.unwrap();
    assert_eq!(modem.status().link.state, LinkState::Disconnected);
}
