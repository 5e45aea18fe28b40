use secret_share_credentials::{
    Authority, Did, Ed25519KeyResolver, Ed25519Signature, Ed25519Signer, Principal, Resolver, sign,
};
use signature::Verifier;
use testresult::TestResult;

fn signed_by<A: Authority>(authority: &A, message: &[u8]) -> TestResult<(Did, Vec<u8>)> {
    let signature = sign(authority, message)?;
    Ok((authority.did(), signature.to_bytes().to_vec()))
}

#[test]
fn a_signature_verifies_through_the_issuer_did_alone() -> TestResult {
    let issuer = Ed25519Signer::generate()?;
    let message = b"storage://bafkreigh2akiscaildc";

    let (did, signature) = signed_by(&issuer, message)?;

    // The verifying side only sees the DID string and the bytes.
    let did: Did = did.to_string().parse()?;
    let verifier = Ed25519KeyResolver.resolve(&did)?;
    let signature = Ed25519Signature::try_from(signature.as_slice())?;
    verifier.verify(message, &signature)?;

    Ok(())
}
