//! Domain records: field reflection and fixed recipes.

mod common;

use common::{Image, TreeShape, MAP_CONTROL, VECTOR_CONTROL};
use usedsize_core::shapes::Shape;
use usedsize_core::types::{Address, Field, TypeId, TypeInfo};
use usedsize_core::{ResolverConfig, SizeError, SizeResolver};

/// Opaque stand-ins for the masternode types.
const INFO_SIZE: u64 = 200;
const TXIN_SIZE: u64 = 40;
const HASH_SIZE: u64 = 32;
const SERVICE_SIZE: u64 = 28;

struct Masternodes
{
    image: Image,
    masternode: TypeId,
    broadcast: TypeId,
    bytes: TypeId,
}

/// `CMasternode` and friends, laid out as
///
/// ```text
/// CMasternode (384 bytes)
///   <base masternode_info_t>          @0    200
///   CMasternodePing lastPing          @200  104
///   std::vector<unsigned char> vchSig @304  24
///   std::map<uint256, int> mapGovernanceObjectsVotedOn @336 48
/// ```
///
/// `CMasternodePing` is reflected: `vin`, `blockHash`, `sigTime`, `vchSig`.
fn masternodes() -> Masternodes
{
    let mut image = Image::new();
    let info = image.record("masternode_info_t", INFO_SIZE, &[]);
    let txin = image.record("CTxIn", TXIN_SIZE, &[]);
    let hash = image.record("uint256", HASH_SIZE, &[]);
    image.record("CService", SERVICE_SIZE, &[]);
    let bytes = image.vector_type(image.uchar);
    let votes = image.map_type(hash, image.int);

    let ping = image.record(
        "CMasternodePing",
        104,
        &[("vin", txin, 0), ("blockHash", hash, 40), ("sigTime", image.long, 72), ("vchSig", bytes, 80)],
    );
    let masternode = image.snapshot.define_type(
        TypeInfo::new("CMasternode", 384)
            .with_field(Field::base(info, 0))
            .with_field(Field::member("lastPing", ping, 200))
            .with_field(Field::member("vchSig", bytes, 304))
            .with_field(Field::static_member("nMinProtocol", image.int))
            .with_field(Field::member("mapGovernanceObjectsVotedOn", votes, 336)),
    );
    let broadcast = image.snapshot.define_type(
        TypeInfo::new("CMasternodeBroadcast", 392)
            .with_field(Field::base(masternode, 0))
            .with_field(Field::member("fRecovery", image.boolean, 384)),
    );

    Masternodes {
        image,
        masternode,
        broadcast,
        bytes,
    }
}

/// Fill a masternode at `at`: `ping_sig` bytes of ping signature, `sig` bytes
/// of signature, `votes` governance votes.
fn place_masternode(image: &mut Image, at: Address, ping_sig: u64, sig: u64, votes: usize)
{
    image.place_vector(at + 200 + 80, 1, ping_sig);
    image.place_vector(at + 304, 1, sig);
    image.place_map(at + 336, 40, votes, TreeShape::Balanced);
}

fn masternode_size(ping_sig: u64, sig: u64, votes: u64) -> u64
{
    let ping = TXIN_SIZE + HASH_SIZE + 8 + VECTOR_CONTROL + ping_sig;
    let literal = 4 * 8 + 2;
    let map = MAP_CONTROL + votes * (HASH_SIZE + 4);
    INFO_SIZE + ping + VECTOR_CONTROL + sig + literal + map
}

#[test]
fn test_masternode_recipe()
{
    let Masternodes { mut image, masternode, .. } = masternodes();
    let at = image.global("mn", masternode);
    place_masternode(&mut image, at, 65, 71, 0);

    let resolver = SizeResolver::new(&image.snapshot, ResolverConfig::default());
    assert!(matches!(resolver.classify(masternode).unwrap(), Shape::Recipe(_)));
    assert_eq!(resolver.size_of("mn").unwrap(), masternode_size(65, 71, 0));
    assert_eq!(masternode_size(65, 71, 0), 546);
}

#[test]
fn test_masternode_recipe_counts_governance_votes()
{
    let Masternodes { mut image, masternode, .. } = masternodes();
    let at = image.global("mn", masternode);
    place_masternode(&mut image, at, 0, 0, 3);

    let resolver = SizeResolver::new(&image.snapshot, ResolverConfig::default());
    assert_eq!(resolver.size_of("mn").unwrap(), masternode_size(0, 0, 3));
}

#[test]
fn test_broadcast_is_masternode_plus_flag()
{
    let Masternodes { mut image, broadcast, .. } = masternodes();
    let at = image.global("mnb", broadcast);
    place_masternode(&mut image, at, 65, 71, 2);

    let resolver = SizeResolver::new(&image.snapshot, ResolverConfig::default());
    assert_eq!(resolver.size_of("mnb").unwrap(), masternode_size(65, 71, 2) + 1);
}

#[test]
fn test_recipe_member_through_typed_address()
{
    let Masternodes { mut image, bytes, .. } = masternodes();
    let at = image.snapshot.allocate(384);
    place_masternode(&mut image, at, 0, 71, 0);

    let resolver = SizeResolver::new(&image.snapshot, ResolverConfig::default());
    let expression = format!("(*(CMasternode*){:#x}).vchSig", at.value());
    assert_eq!(resolver.size_of(&expression).unwrap(), VECTOR_CONTROL + 71);
    assert_eq!(resolver.classify(bytes).unwrap(), Shape::Array);
    assert_eq!(
        resolver.size_of(&format!("*(CMasternode*){}", at.value())).unwrap(),
        masternode_size(0, 71, 0)
    );
}

#[test]
fn test_recipe_with_missing_view_type_fails()
{
    let mut image = Image::new();
    let masternode = image.record("CMasternode", 8, &[("vchSig", image.long, 0)]);
    image.global("mn", masternode);

    let resolver = SizeResolver::new(&image.snapshot, ResolverConfig::default());
    assert!(matches!(
        resolver.size_of("mn").unwrap_err(),
        SizeError::UnresolvedSymbol(_)
    ));
}

#[test]
fn test_reflected_record_sums_fields()
{
    let mut image = Image::new();
    let ints = image.vector_type(image.int);
    let widget = image.record("Widget", 40, &[("id", image.int, 0), ("parts", ints, 8), ("dirty", image.boolean, 32)]);
    let at = image.global("widget", widget);
    image.place_vector(at + 8, 4, 3);

    let plain = SizeResolver::new(&image.snapshot, ResolverConfig::default());
    assert_eq!(plain.size_of("widget").unwrap(), 40);

    let reflected = SizeResolver::new(&image.snapshot, ResolverConfig::default().with_record_type("Widget"));
    assert_eq!(reflected.size_of("widget").unwrap(), 4 + VECTOR_CONTROL + 12 + 1);
}

#[test]
fn test_reflected_record_recurses_into_bases()
{
    let mut image = Image::new();
    let ints = image.vector_type(image.int);
    let base = image.record("WidgetBase", 32, &[("parts", ints, 8)]);
    let derived = image.snapshot.define_type(
        TypeInfo::new("CMasternodeIndex", 40)
            .with_field(Field::base(base, 0))
            .with_field(Field::member("nCount", image.int, 32)),
    );
    let at = image.global("index", derived);
    image.place_vector(at + 8, 4, 5);

    // A base that is not itself special counts its static size.
    let resolver = SizeResolver::new(&image.snapshot, ResolverConfig::default());
    assert_eq!(resolver.size_of("index").unwrap(), 32 + 4);

    let resolver = SizeResolver::new(&image.snapshot, ResolverConfig::default().with_record_type("WidgetBase"));
    assert_eq!(resolver.size_of("index").unwrap(), VECTOR_CONTROL + 20 + 4);
}

#[test]
fn test_reflected_record_skips_static_members()
{
    let mut image = Image::new();
    let ints = image.vector_type(image.int);
    let widget = image.snapshot.define_type(
        TypeInfo::new("Widget", 32)
            .with_field(Field::member("id", image.int, 0))
            .with_field(Field::static_member("shared", ints))
            .with_field(Field::member("parts", ints, 8)),
    );
    let at = image.global("widget", widget);
    image.place_vector(at + 8, 4, 2);

    let resolver = SizeResolver::new(&image.snapshot, ResolverConfig::default().with_record_type("Widget"));
    assert_eq!(resolver.size_of("widget").unwrap(), 4 + VECTOR_CONTROL + 8);
}

/// `CMasternodeVerification`: two inputs, an address, two counters and two
/// signatures.
#[test]
fn test_verification_recipe()
{
    let mut image = Image::new();
    let txin = image.record("CTxIn", TXIN_SIZE, &[]);
    let service = image.record("CService", SERVICE_SIZE, &[]);
    let bytes = image.vector_type(image.uchar);
    let verification = image.record(
        "CMasternodeVerification",
        168,
        &[
            ("vin1", txin, 0),
            ("vin2", txin, 40),
            ("addr", service, 80),
            ("nonce", image.int, 108),
            ("nBlockHeight", image.int, 112),
            ("vchSig1", bytes, 120),
            ("vchSig2", bytes, 144),
        ],
    );
    let at = image.global("mnv", verification);
    image.place_vector(at + 120, 1, 65);
    image.place_vector(at + 144, 1, 70);

    let resolver = SizeResolver::new(&image.snapshot, ResolverConfig::default());
    assert!(matches!(resolver.classify(verification).unwrap(), Shape::Recipe(_)));
    let expected = 2 * TXIN_SIZE + SERVICE_SIZE + 16 + VECTOR_CONTROL + 65 + VECTOR_CONTROL + 70;
    assert_eq!(resolver.size_of("mnv").unwrap(), expected);
}

/// `CDarksendQueue`: denomination, input, time and ready flag, signature and
/// tested flag.
#[test]
fn test_darksend_queue_recipe()
{
    let mut image = Image::new();
    let txin = image.record("CTxIn", TXIN_SIZE, &[]);
    let bytes = image.vector_type(image.uchar);
    let queue = image.record(
        "CDarksendQueue",
        96,
        &[
            ("nDenom", image.int, 0),
            ("vin", txin, 8),
            ("nTime", image.long, 48),
            ("fReady", image.boolean, 56),
            ("vchSig", bytes, 64),
            ("fTested", image.boolean, 88),
        ],
    );
    let at = image.global("dsq", queue);
    image.place_vector(at + 64, 1, 71);

    let resolver = SizeResolver::new(&image.snapshot, ResolverConfig::default());
    assert_eq!(
        resolver.size_of("dsq").unwrap(),
        8 + TXIN_SIZE + 9 + VECTOR_CONTROL + 71 + 1
    );
}

/// `CDarkSendEntry`: input and output vectors, collateral transaction and
/// address.
#[test]
fn test_darksend_entry_recipe()
{
    let mut image = Image::new();
    image.record("CService", SERVICE_SIZE, &[]);
    let service = image.record("CAddress", SERVICE_SIZE + 12, &[]);
    let transaction = image.record("CTransaction", 80, &[]);
    let input = image.record("CTxDSIn", 56, &[]);
    let output = image.record("CTxDSOut", 48, &[]);
    let inputs = image.vector_type(input);
    let outputs = image.vector_type(output);
    let entry = image.record(
        "CDarkSendEntry",
        168,
        &[
            ("vecTxDSIn", inputs, 0),
            ("vecTxDSOut", outputs, 24),
            ("txCollateral", transaction, 48),
            ("addr", service, 128),
        ],
    );
    let at = image.global("entry", entry);
    image.place_vector(at, 56, 2);
    image.place_vector(at + 24, 48, 3);

    // `addr` is charged as a `CService`, not its declared type.
    let resolver = SizeResolver::new(&image.snapshot, ResolverConfig::default());
    assert_eq!(
        resolver.size_of("entry").unwrap(),
        VECTOR_CONTROL + 2 * 56 + VECTOR_CONTROL + 3 * 48 + 80 + SERVICE_SIZE
    );
}

#[test]
fn test_recipe_with_misnamed_member_fails()
{
    let mut image = Image::new();
    let txin = image.record("CTxIn", TXIN_SIZE, &[]);
    let bytes = image.vector_type(image.uchar);
    let queue = image.record("CDarksendQueue", 72, &[("vin", txin, 8), ("vchSignature", bytes, 48)]);
    image.global("dsq", queue);

    let resolver = SizeResolver::new(&image.snapshot, ResolverConfig::default());
    assert!(matches!(
        resolver.size_of("dsq").unwrap_err(),
        SizeError::UnresolvedSymbol(_)
    ));
}
