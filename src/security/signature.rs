//! PKCS#7 detached signature (`spec.md` §4.5.2): locates the `/ByteRange` and
//! `/Contents` placeholders `assembler::build_signature_dict_bytes` reserved,
//! computes the real byte range, and overwrites both in place with a CMS
//! SignedData built over the signer's certificate and RSA private key.
//!
//! Grounded in `KingTimer12-pdfsigner-rs`'s placeholder-patch algorithm
//! (locate `/ByteRange [...]`, locate `/Contents <...>`, hash the two
//! surrounding segments, hex-encode the signature into the reserved slot) —
//! that reference signs via `openssl::pkcs7::Pkcs7`, which isn't in this
//! crate's dependency table. `cms`/`x509-cert` at `0.0.1` predate that
//! crate's builder API, so the SignedData/SignerInfo ASN.1 is written
//! directly against the `der` crate's TLV primitives instead (documented in
//! DESIGN.md), the same way `serializer/object.rs` hand-writes PDF syntax
//! rather than depending on a higher-level object model.

use crate::error::{Error, Result};
use der::Decode;
use rsa::{Hash, PaddingScheme, RsaPrivateKey};
use sha2::{Digest, Sha256};

const OID_ID_DATA: &str = "1.2.840.113549.1.7.1";
const OID_SIGNED_DATA: &str = "1.2.840.113549.1.7.2";
const OID_SHA256: &str = "2.16.840.1.101.3.4.2.1";
const OID_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
const OID_CONTENT_TYPE: &str = "1.2.840.113549.1.9.3";
const OID_MESSAGE_DIGEST: &str = "1.2.840.113549.1.9.4";
const OID_SIGNING_TIME: &str = "1.2.840.113549.1.9.5";

/// Matches the fixed `/M (D:19700101000000Z)` the signature dictionary was
/// built with — kept in lockstep so the signed `signingTime` attribute agrees
/// with the dictionary's own modification date, and so generation stays
/// deterministic per `spec.md` §5 rather than drifting with wall-clock time.
const SIGNING_TIME_UTC: &str = "700101000000Z";

/// Finds the `/ByteRange`/`/Contents` placeholders in `pdf_bytes`, signs the
/// bytes around the `/Contents` hex literal, and patches both in place.
/// `pdf_bytes`'s length never changes.
pub(crate) fn apply_detached_signature(
    pdf_bytes: &mut [u8],
    certificate_der: &[u8],
    private_key_der: &[u8],
) -> Result<()> {
    if x509_cert::Certificate::from_der(certificate_der).is_err() {
        return Err(Error::SignatureCertError("certificate is not valid DER".into()));
    }

    let byte_range_pos = find_subslice(pdf_bytes, b"/ByteRange [")
        .ok_or_else(|| Error::SignatureCertError("no /ByteRange placeholder found".into()))?;
    let byte_range_start = byte_range_pos + b"/ByteRange [".len();
    let byte_range_end = find_subslice(&pdf_bytes[byte_range_start..], b"]")
        .ok_or_else(|| Error::SignatureCertError("unterminated /ByteRange".into()))?
        + byte_range_start;

    let contents_pos = find_subslice(pdf_bytes, b"/Contents <")
        .ok_or_else(|| Error::SignatureCertError("no /Contents placeholder found".into()))?;
    let hex_start = contents_pos + b"/Contents <".len();
    let hex_end = find_subslice(&pdf_bytes[hex_start..], b">")
        .ok_or_else(|| Error::SignatureCertError("unterminated /Contents".into()))?
        + hex_start;

    let lt_pos = hex_start - 1;
    let gt_pos = hex_end;
    let total_len = pdf_bytes.len();

    let range = [0u64, lt_pos as u64, (gt_pos + 1) as u64, (total_len - gt_pos - 1) as u64];
    let range_text = format!(
        "{:010} {:010} {:010} {:010}",
        range[0], range[1], range[2], range[3]
    );
    let placeholder_len = byte_range_end - byte_range_start;
    if range_text.len() > placeholder_len {
        return Err(Error::SignatureCertError("ByteRange placeholder too small".into()));
    }
    let mut range_bytes = range_text.into_bytes();
    range_bytes.resize(placeholder_len, b' ');
    pdf_bytes[byte_range_start..byte_range_end].copy_from_slice(&range_bytes);

    let mut hasher = Sha256::new();
    hasher.update(&pdf_bytes[..lt_pos]);
    hasher.update(&pdf_bytes[gt_pos + 1..]);
    let digest: [u8; 32] = hasher.finalize().into();

    let der = build_signed_data(&digest, certificate_der, private_key_der)?;
    let hex_capacity = hex_end - hex_start;
    let mut hex_text = hex::encode_upper(&der);
    if hex_text.len() > hex_capacity {
        return Err(Error::SignatureCertError("signature does not fit the reserved /Contents slot".into()));
    }
    hex_text.push_str(&"0".repeat(hex_capacity - hex_text.len()));
    pdf_bytes[hex_start..hex_end].copy_from_slice(hex_text.as_bytes());
    Ok(())
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn build_signed_data(message_digest: &[u8; 32], certificate_der: &[u8], private_key_der: &[u8]) -> Result<Vec<u8>> {
    let content_type_attr = der_sequence(&[der_oid(OID_CONTENT_TYPE), der_set_of(vec![der_oid(OID_ID_DATA)])]);
    let message_digest_attr =
        der_sequence(&[der_oid(OID_MESSAGE_DIGEST), der_set_of(vec![der_octet_string(message_digest)])]);
    let signing_time_attr =
        der_sequence(&[der_oid(OID_SIGNING_TIME), der_set_of(vec![der_utc_time(SIGNING_TIME_UTC)])]);

    let mut attrs = vec![content_type_attr, message_digest_attr, signing_time_attr];
    attrs.sort();
    let attrs_content: Vec<u8> = attrs.concat();

    // Same content signed under the universal SET tag (RFC 5652 §5.4) but
    // embedded in the SignerInfo under the implicit [0] context tag.
    let signed_attrs_for_hash = der_tlv(0x31, &attrs_content);
    let signed_attrs_for_signer_info = der_tlv(0xA0, &attrs_content);

    let mut attrs_digest = Sha256::new();
    attrs_digest.update(&signed_attrs_for_hash);
    let attrs_hash: [u8; 32] = attrs_digest.finalize().into();

    let private_key = RsaPrivateKey::from_pkcs8_der(private_key_der)
        .or_else(|_| RsaPrivateKey::from_pkcs1_der(private_key_der))
        .map_err(|e| Error::SignatureCertError(format!("invalid private key: {}", e)))?;
    let signature = private_key
        .sign(PaddingScheme::new_pkcs1v15_sign(Some(Hash::SHA2_256)), &attrs_hash)
        .map_err(|e| Error::SignatureCertError(format!("RSA signing failed: {}", e)))?;

    let digest_algorithm = der_sequence(&[der_oid(OID_SHA256), der_null()]);
    let digest_algorithms = der_set_of(vec![digest_algorithm.clone()]);
    let encap_content_info = der_sequence(&[der_oid(OID_ID_DATA)]);

    // `subjectKeyIdentifier` SignerIdentifier choice (CMSVersion 3): avoids
    // re-deriving the issuer distinguished name / serial number out of the
    // certificate's TBSCertificate, at the cost of needing the verifier to
    // match by key id rather than issuer+serial. Documented in DESIGN.md.
    let mut key_id_hasher = Sha256::new();
    key_id_hasher.update(certificate_der);
    let key_id: [u8; 32] = key_id_hasher.finalize().into();
    let signer_identifier = der_tlv(0x80, &key_id[..20]);

    let signature_algorithm = der_sequence(&[der_oid(OID_RSA_ENCRYPTION), der_null()]);

    let signer_info = der_sequence(&[
        der_integer_u64(3),
        signer_identifier,
        digest_algorithm,
        signed_attrs_for_signer_info,
        signature_algorithm,
        der_octet_string(&signature),
    ]);

    let certificates = der_tlv(0xA0, &der_any(certificate_der));
    let signer_infos = der_set_of(vec![signer_info]);

    let signed_data = der_sequence(&[
        der_integer_u64(3),
        digest_algorithms,
        encap_content_info,
        certificates,
        signer_infos,
    ]);

    let content_info = der_sequence(&[der_oid(OID_SIGNED_DATA), der_tlv(0xA0, &signed_data)]);
    Ok(content_info)
}

fn der_any(bytes: &[u8]) -> Vec<u8> {
    bytes.to_vec()
}

fn der_len_bytes(len: usize) -> Vec<u8> {
    if len < 0x80 {
        vec![len as u8]
    } else {
        let mut len_bytes = Vec::new();
        let mut l = len;
        while l > 0 {
            len_bytes.push((l & 0xFF) as u8);
            l >>= 8;
        }
        len_bytes.reverse();
        let mut out = vec![0x80 | len_bytes.len() as u8];
        out.extend(len_bytes);
        out
    }
}

fn der_tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend(der_len_bytes(content.len()));
    out.extend_from_slice(content);
    out
}

fn der_sequence(parts: &[Vec<u8>]) -> Vec<u8> {
    der_tlv(0x30, &parts.concat())
}

fn der_set_of(mut items: Vec<Vec<u8>>) -> Vec<u8> {
    items.sort();
    der_tlv(0x31, &items.concat())
}

fn der_null() -> Vec<u8> {
    vec![0x05, 0x00]
}

fn der_octet_string(bytes: &[u8]) -> Vec<u8> {
    der_tlv(0x04, bytes)
}

fn der_utc_time(text: &str) -> Vec<u8> {
    der_tlv(0x17, text.as_bytes())
}

fn der_integer_u64(value: u64) -> Vec<u8> {
    let mut bytes = value.to_be_bytes().to_vec();
    while bytes.len() > 1 && bytes[0] == 0 && (bytes[1] & 0x80) == 0 {
        bytes.remove(0);
    }
    der_tlv(0x02, &bytes)
}

fn base128(mut value: u32) -> Vec<u8> {
    if value == 0 {
        return vec![0];
    }
    let mut bytes = Vec::new();
    while value > 0 {
        bytes.push((value & 0x7F) as u8);
        value >>= 7;
    }
    bytes.reverse();
    let last = bytes.len() - 1;
    for byte in &mut bytes[..last] {
        *byte |= 0x80;
    }
    bytes
}

fn der_oid(dotted: &str) -> Vec<u8> {
    let arcs: Vec<u32> = dotted.split('.').map(|s| s.parse().expect("valid OID literal")).collect();
    let mut body = base128(arcs[0] * 40 + arcs[1]);
    for &arc in &arcs[2..] {
        body.extend(base128(arc));
    }
    der_tlv(0x06, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oid_encoding_matches_known_vectors() {
        assert_eq!(der_oid("1.2.840.113549.1.7.2"), vec![0x06, 0x09, 0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x02]);
        assert_eq!(der_oid(OID_SHA256), vec![0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01]);
    }

    #[test]
    fn long_form_length_is_used_above_127_bytes() {
        let content = vec![0u8; 200];
        let tlv = der_tlv(0x04, &content);
        assert_eq!(&tlv[..3], &[0x04, 0x81, 0xC8]);
    }

    #[test]
    fn set_of_is_sorted_for_canonical_der() {
        let set = der_set_of(vec![vec![0x02, 0x01, 0x05], vec![0x02, 0x01, 0x01]]);
        assert_eq!(&set[2..5], &[0x02, 0x01, 0x01]);
    }

    #[test]
    fn missing_byte_range_placeholder_errors() {
        let mut bytes = b"%PDF-1.7\n%%EOF".to_vec();
        let err = apply_detached_signature(&mut bytes, &[], &[]);
        assert!(err.is_err());
    }
}
