use crate::*;

// ============================================================================
//  DISCRIMINATORS
// ============================================================================

#[test]
fn test_discriminators_are_distinct() {
    let all = [INITIATOR_REQUEST, ACCEPTOR_RESPONSE, ACCEPTOR_REQUEST, INITIATOR_RESPONSE];
    for (i, a) in all.iter().enumerate() {
        for b in &all[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn test_roles_send_disjoint_values() {
    let initiator = FrameCodec::new(Role::Initiator);
    let acceptor = FrameCodec::new(Role::Acceptor);
    assert_eq!(initiator.role(), Role::Initiator);
    assert_eq!(acceptor.role(), Role::Acceptor);

    for kind in [Kind::Request, Kind::Response] {
        assert_ne!(initiator.outbound(kind), acceptor.outbound(kind));
    }
    assert_eq!(initiator.outbound(Kind::Request), INITIATOR_REQUEST);
    assert_eq!(acceptor.outbound(Kind::Response), ACCEPTOR_RESPONSE);
    assert_eq!(acceptor.outbound(Kind::Request), ACCEPTOR_REQUEST);
    assert_eq!(initiator.outbound(Kind::Response), INITIATOR_RESPONSE);
}

#[test]
fn test_role_peer_is_involution() {
    assert_eq!(Role::Initiator.peer(), Role::Acceptor);
    assert_eq!(Role::Acceptor.peer().peer(), Role::Acceptor);
}

// ============================================================================
//  FRAME CODEC
// ============================================================================

#[test]
fn test_request_is_classified_by_peer() {
    let initiator = FrameCodec::new(Role::Initiator);
    let acceptor = FrameCodec::new(Role::Acceptor);

    let frame = initiator.encode(Kind::Request, &[0x01, 0x02]);
    assert_eq!(frame, vec![INITIATOR_REQUEST, 0x01, 0x02]);
    assert_eq!(acceptor.decode(&frame), Ok(Incoming::Request(&[0x01, 0x02])));
}

#[test]
fn test_response_is_classified_by_peer() {
    let initiator = FrameCodec::new(Role::Initiator);
    let acceptor = FrameCodec::new(Role::Acceptor);

    let frame = acceptor.encode(Kind::Response, &[0x02, 0x01]);
    assert_eq!(initiator.decode(&frame), Ok(Incoming::Response(&[0x02, 0x01])));
}

#[test]
fn test_own_discriminator_is_unrecognized() {
    let initiator = FrameCodec::new(Role::Initiator);
    let looped = initiator.encode(Kind::Request, b"echo");

    assert_eq!(
        initiator.decode(&looped),
        Ok(Incoming::Unrecognized { discriminator: INITIATOR_REQUEST, len: 4 })
    );
}

#[test]
fn test_foreign_discriminator_is_unrecognized() {
    let acceptor = FrameCodec::new(Role::Acceptor);
    assert_eq!(
        acceptor.decode(&[0xFF, 1, 2, 3]),
        Ok(Incoming::Unrecognized { discriminator: 0xFF, len: 3 })
    );
}

#[test]
fn test_empty_message_is_an_error() {
    let acceptor = FrameCodec::new(Role::Acceptor);
    assert_eq!(acceptor.decode(&[]), Err(Error::EmptyFrame));
}

#[test]
fn test_discriminator_only_frame_has_empty_payload() {
    let acceptor = FrameCodec::new(Role::Acceptor);
    assert_eq!(acceptor.decode(&[INITIATOR_REQUEST]), Ok(Incoming::Request(&[])));
}

// ============================================================================
//  ENVELOPE
// ============================================================================

#[test]
fn test_call_envelope_layout() -> anyhow::Result<()> {
    let bytes = CallEncoder::new(0x0102, b"hi").encode();
    assert_eq!(bytes, vec![0, 0, 0, 0, 0, 0, 0x01, 0x02, b'h', b'i']);

    let call = CallDecoder::decode(&bytes)?;
    assert_eq!(call.seq, 0x0102);
    assert_eq!(call.body, b"hi");
    Ok(())
}

#[test]
fn test_reply_ok_preserves_body() -> anyhow::Result<()> {
    let body = [0u8, 0xFF, 0x01];
    let bytes = ReplyOkEncoder::new(7, &body).encode();
    let reply = ReplyDecoder::decode(&bytes)?;

    assert_eq!(reply.seq, 7);
    assert_eq!(reply.status, Ok(&body[..]));
    Ok(())
}

#[test]
fn test_reply_err_carries_message() -> anyhow::Result<()> {
    let bytes = ReplyErrEncoder::new(9, "no such method").encode();
    let reply = ReplyDecoder::decode(&bytes)?;

    assert_eq!(reply.seq, 9);
    assert_eq!(reply.status, Err("no such method".to_string()));
    Ok(())
}

#[test]
fn test_reply_unknown_status() {
    let mut bytes = ReplyOkEncoder::new(1, b"x").encode();
    bytes[8] = 0x7F;
    assert_eq!(ReplyDecoder::decode(&bytes), Err(Error::UnknownStatus(0x7F)));
}

#[test]
fn test_truncated_envelopes() {
    assert_eq!(
        CallDecoder::decode(&[1, 2, 3]),
        Err(Error::Truncated { needed: 8, found: 3 })
    );
    // A full seq but no status byte.
    assert_eq!(
        ReplyDecoder::decode(&5u64.to_be_bytes()),
        Err(Error::Truncated { needed: 9, found: 8 })
    );
}

#[test]
fn test_decode_seq_reads_either_envelope() -> anyhow::Result<()> {
    assert_eq!(decode_seq(&CallEncoder::new(42, b"").encode())?, 42);
    assert_eq!(decode_seq(&ReplyErrEncoder::new(43, "boom").encode())?, 43);
    assert!(decode_seq(&[]).is_err());
    Ok(())
}

#[test]
fn test_error_display() {
    assert_eq!(Error::EmptyFrame.to_string(), "empty frame");
    assert_eq!(Error::UnknownStatus(0x7F).to_string(), "unknown reply status 0x7f");
}
