use super::*;
use async_trait::async_trait;
use chainblog_chains::ChainError;
use chainblog_types::{AbiVersion, NetworkKind, Post, TxHash, UserRecord};
use chainblog_wallet::WalletEvent;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::broadcast;

const CHAIN_A: ChainId = ChainId(100);
const CHAIN_B: ChainId = ChainId(204);

fn addr(byte: u8) -> Address {
	Address::repeat_byte(byte)
}

fn descriptor(chain_id: ChainId) -> NetworkDescriptor {
	NetworkDescriptor {
		chain_id,
		name: format!("net-{chain_id}"),
		contract: addr(0xcc),
		rpc_url: "https://rpc.example".into(),
		abi_version: AbiVersion::V5,
		kind: NetworkKind::Testnet,
		color: String::new(),
		default_active: true,
	}
}

fn registry() -> Arc<NetworkRegistry> {
	Arc::new(NetworkRegistry::new(vec![
		descriptor(CHAIN_A),
		descriptor(CHAIN_B),
	]))
}

struct MockWallet {
	accounts: Mutex<Vec<Address>>,
	known_chains: Mutex<HashSet<ChainId>>,
	active_chain: Mutex<ChainId>,
	submissions: Mutex<Vec<(ChainId, Vec<u8>)>>,
	reject_submit: bool,
	/// Flipped on successful submission; the mock reader consults it.
	registered_flag: Arc<AtomicBool>,
	events: broadcast::Sender<WalletEvent>,
}

impl MockWallet {
	fn new(accounts: Vec<Address>, active_chain: ChainId) -> Self {
		let (events, _) = broadcast::channel(16);
		Self {
			accounts: Mutex::new(accounts),
			known_chains: Mutex::new(HashSet::from([active_chain])),
			active_chain: Mutex::new(active_chain),
			submissions: Mutex::new(Vec::new()),
			reject_submit: false,
			registered_flag: Arc::new(AtomicBool::new(false)),
			events,
		}
	}

	fn submission_count(&self) -> usize {
		self.submissions.lock().unwrap().len()
	}
}

#[async_trait]
impl WalletInterface for MockWallet {
	async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
		Ok(self.accounts.lock().unwrap().clone())
	}

	async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
		let accounts = self.accounts.lock().unwrap().clone();
		if accounts.is_empty() {
			return Err(WalletError::Rejected);
		}
		Ok(accounts)
	}

	async fn chain_id(&self) -> Result<ChainId, WalletError> {
		Ok(*self.active_chain.lock().unwrap())
	}

	async fn switch_chain(&self, chain_id: ChainId) -> Result<(), WalletError> {
		if !self.known_chains.lock().unwrap().contains(&chain_id) {
			return Err(WalletError::UnknownChain(chain_id));
		}
		*self.active_chain.lock().unwrap() = chain_id;
		Ok(())
	}

	async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), WalletError> {
		self.known_chains.lock().unwrap().insert(network.chain_id);
		Ok(())
	}

	async fn submit(&self, chain_id: ChainId, tx: Transaction) -> Result<TxHash, WalletError> {
		if self.reject_submit {
			return Err(WalletError::Rejected);
		}
		self.submissions.lock().unwrap().push((chain_id, tx.data));
		self.registered_flag.store(true, Ordering::SeqCst);
		Ok(TxHash::repeat_byte(0xab))
	}

	async fn wait_for_confirmation(
		&self,
		_chain_id: ChainId,
		hash: TxHash,
	) -> Result<TransactionReceipt, WalletError> {
		Ok(TransactionReceipt {
			hash,
			block_number: 7,
			success: true,
		})
	}

	fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
		self.events.subscribe()
	}
}

#[derive(Default)]
struct MockReader {
	users: HashMap<(ChainId, Address), UserRecord>,
	owners: HashMap<ChainId, Address>,
	failing_chains: HashSet<ChainId>,
	/// When set, `user` reports registration once the flag is true.
	registration_flag: Option<Arc<AtomicBool>>,
}

#[async_trait]
impl ChainReader for MockReader {
	async fn paginated_posts(
		&self,
		_network: &NetworkDescriptor,
		_page: u64,
		_page_size: u64,
	) -> Result<Vec<Post>, ChainError> {
		Ok(Vec::new())
	}

	async fn post(&self, _network: &NetworkDescriptor, _id: u64) -> Result<Post, ChainError> {
		Err(ChainError::Call("no posts in mock".into()))
	}

	async fn post_ids(
		&self,
		_network: &NetworkDescriptor,
		_author: Address,
	) -> Result<Vec<u64>, ChainError> {
		Ok(Vec::new())
	}

	async fn post_count(&self, _network: &NetworkDescriptor) -> Result<u64, ChainError> {
		Ok(0)
	}

	async fn user(
		&self,
		network: &NetworkDescriptor,
		address: Address,
	) -> Result<UserRecord, ChainError> {
		if self.failing_chains.contains(&network.chain_id) {
			return Err(ChainError::Rpc("chain down".into()));
		}
		if let Some(flag) = &self.registration_flag {
			if flag.load(Ordering::SeqCst) {
				return Ok(UserRecord {
					address,
					username: "fresh".into(),
					is_banned: false,
					is_registered: true,
				});
			}
		}
		Ok(self
			.users
			.get(&(network.chain_id, address))
			.cloned()
			.unwrap_or_default())
	}

	async fn owner(&self, network: &NetworkDescriptor) -> Result<Address, ChainError> {
		if self.failing_chains.contains(&network.chain_id) {
			return Err(ChainError::Rpc("chain down".into()));
		}
		Ok(self
			.owners
			.get(&network.chain_id)
			.copied()
			.unwrap_or(Address::ZERO))
	}

	async fn user_count(&self, _network: &NetworkDescriptor) -> Result<u64, ChainError> {
		Ok(0)
	}

	async fn registered_user(
		&self,
		_network: &NetworkDescriptor,
		_index: u64,
	) -> Result<Address, ChainError> {
		Err(ChainError::Call("no roster in mock".into()))
	}
}

fn controller(wallet: MockWallet, reader: MockReader) -> (SessionController, Arc<MockWallet>) {
	let wallet = Arc::new(wallet);
	let session = SessionController::new(registry(), wallet.clone(), Arc::new(reader));
	(session, wallet)
}

fn registered_record(address: Address, banned: bool) -> UserRecord {
	UserRecord {
		address,
		username: "alice".into(),
		is_banned: banned,
		is_registered: true,
	}
}

#[tokio::test]
async fn test_connect_derives_status_from_active_chain() {
	let user = addr(0x01);
	let mut reader = MockReader::default();
	reader
		.users
		.insert((CHAIN_A, user), registered_record(user, false));
	reader.owners.insert(CHAIN_A, user);
	let (session, _) = controller(MockWallet::new(vec![user], CHAIN_A), reader);

	let state = session.connect().await.unwrap();
	assert!(state.connected);
	assert_eq!(state.address, Some(user));
	assert_eq!(state.chain_id, Some(CHAIN_A));

	let status = session.status().await;
	assert!(status.is_registered);
	assert_eq!(status.username, "alice");
	assert!(status.is_owner);
	assert!(!status.is_banned);
}

#[tokio::test]
async fn test_zero_accounts_disconnects_and_clears_status() {
	let user = addr(0x01);
	let mut reader = MockReader::default();
	reader
		.users
		.insert((CHAIN_A, user), registered_record(user, false));
	let (session, _) = controller(MockWallet::new(vec![user], CHAIN_A), reader);

	session.connect().await.unwrap();
	assert!(session.status().await.is_registered);

	session.handle_accounts_changed(Vec::new()).await;
	let state = session.session().await;
	assert!(!state.connected);
	assert_eq!(state.address, None);
	assert!(!session.status().await.is_registered);
}

#[tokio::test]
async fn test_chain_change_re_derives_without_carryover() {
	let user = addr(0x01);
	let mut reader = MockReader::default();
	// Registered and owner on chain A, a stranger on chain B.
	reader
		.users
		.insert((CHAIN_A, user), registered_record(user, false));
	reader.owners.insert(CHAIN_A, user);
	let (session, _) = controller(MockWallet::new(vec![user], CHAIN_A), reader);

	session.connect().await.unwrap();
	assert!(session.status().await.is_owner);

	session.handle_chain_changed(CHAIN_B).await;
	let status = session.status().await;
	assert!(!status.is_registered);
	assert!(!status.is_owner);
	assert_eq!(status.username, "");
}

#[tokio::test]
async fn test_derivation_failure_degrades_but_stays_connected() {
	let user = addr(0x01);
	let mut reader = MockReader::default();
	reader.failing_chains.insert(CHAIN_A);
	let (session, _) = controller(MockWallet::new(vec![user], CHAIN_A), reader);

	let state = session.connect().await.unwrap();
	assert!(state.connected);
	let status = session.status().await;
	assert!(!status.is_registered);
	assert!(!status.is_banned);
	assert!(!status.is_owner);
}

#[tokio::test]
async fn test_switch_unknown_chain_adds_then_retries() {
	let user = addr(0x01);
	let (session, wallet) = controller(MockWallet::new(vec![user], CHAIN_A), MockReader::default());

	session.connect().await.unwrap();
	// CHAIN_B is in the registry but the wallet has never seen it.
	session.switch_chain(CHAIN_B).await.unwrap();
	assert_eq!(wallet.chain_id().await.unwrap(), CHAIN_B);
	assert_eq!(session.session().await.chain_id, Some(CHAIN_B));
}

#[tokio::test]
async fn test_switch_to_unregistered_chain_fails() {
	let user = addr(0x01);
	let (session, _) = controller(MockWallet::new(vec![user], CHAIN_A), MockReader::default());

	session.connect().await.unwrap();
	let err = session.switch_chain(ChainId(999)).await.unwrap_err();
	assert!(matches!(err, SessionError::UnknownChain(ChainId(999))));
}

#[tokio::test]
async fn test_create_post_requires_registration() {
	let user = addr(0x01);
	let (session, wallet) = controller(MockWallet::new(vec![user], CHAIN_A), MockReader::default());

	session.connect().await.unwrap();
	let draft = PostDraft::new("hello", "body");
	let err = session.create_post(&draft).await.unwrap_err();
	assert!(matches!(err, SessionError::NotRegistered));
	assert_eq!(wallet.submission_count(), 0);
}

#[tokio::test]
async fn test_restore_silently_connects_and_derives_status() {
	let user = addr(0x01);
	let mut reader = MockReader::default();
	reader
		.users
		.insert((CHAIN_A, user), registered_record(user, false));
	let (session, _) = controller(MockWallet::new(vec![user], CHAIN_A), reader);

	let state = session.restore().await;
	assert!(state.connected);
	assert_eq!(state.address, Some(user));
	assert_eq!(state.chain_id, Some(CHAIN_A));

	let status = session.status().await;
	assert!(status.is_registered);
	assert_eq!(status.username, "alice");
}

#[tokio::test]
async fn test_restore_without_authorized_accounts_stays_disconnected() {
	let (session, _) = controller(MockWallet::new(vec![], CHAIN_A), MockReader::default());

	let state = session.restore().await;
	assert!(!state.connected);
	assert_eq!(state.address, None);
	assert!(!session.status().await.is_registered);
}

#[tokio::test]
async fn test_create_post_refused_when_banned() {
	let user = addr(0x01);
	let mut reader = MockReader::default();
	reader
		.users
		.insert((CHAIN_A, user), registered_record(user, true));
	let (session, wallet) = controller(MockWallet::new(vec![user], CHAIN_A), reader);

	session.connect().await.unwrap();
	let err = session.create_post(&PostDraft::new("t", "c")).await.unwrap_err();
	assert!(matches!(err, SessionError::Banned));
	assert_eq!(wallet.submission_count(), 0);
}

#[tokio::test]
async fn test_create_post_submits_to_active_chain() {
	let user = addr(0x01);
	let mut reader = MockReader::default();
	reader
		.users
		.insert((CHAIN_A, user), registered_record(user, false));
	let (session, wallet) = controller(MockWallet::new(vec![user], CHAIN_A), reader);

	session.connect().await.unwrap();
	let receipt = session.create_post(&PostDraft::new("t", "c")).await.unwrap();
	assert!(receipt.success);

	let submissions = wallet.submissions.lock().unwrap();
	assert_eq!(submissions.len(), 1);
	assert_eq!(submissions[0].0, CHAIN_A);
	assert!(!submissions[0].1.is_empty());
}

#[tokio::test]
async fn test_wallet_rejection_surfaces_and_leaves_status_intact() {
	let user = addr(0x01);
	let mut reader = MockReader::default();
	reader
		.users
		.insert((CHAIN_A, user), registered_record(user, false));
	let mut wallet = MockWallet::new(vec![user], CHAIN_A);
	wallet.reject_submit = true;
	let (session, _) = controller(wallet, reader);

	session.connect().await.unwrap();
	let err = session.create_post(&PostDraft::new("t", "c")).await.unwrap_err();
	assert!(matches!(err, SessionError::Wallet(WalletError::Rejected)));
	assert!(session.status().await.is_registered);
}

#[tokio::test]
async fn test_delete_post_refused_when_banned() {
	let user = addr(0x01);
	let mut reader = MockReader::default();
	reader
		.users
		.insert((CHAIN_A, user), registered_record(user, true));
	let (session, wallet) = controller(MockWallet::new(vec![user], CHAIN_A), reader);

	session.connect().await.unwrap();
	let err = session.delete_post(CHAIN_A, 3).await.unwrap_err();
	assert!(matches!(err, SessionError::Banned));
	assert_eq!(wallet.submission_count(), 0);
}

#[tokio::test]
async fn test_delete_post_requires_registration() {
	let user = addr(0x01);
	let (session, wallet) = controller(MockWallet::new(vec![user], CHAIN_A), MockReader::default());

	session.connect().await.unwrap();
	let err = session.delete_post(CHAIN_A, 3).await.unwrap_err();
	assert!(matches!(err, SessionError::NotRegistered));
	assert_eq!(wallet.submission_count(), 0);
}

#[tokio::test]
async fn test_update_post_refuses_cross_chain_target() {
	let user = addr(0x01);
	let mut reader = MockReader::default();
	reader
		.users
		.insert((CHAIN_A, user), registered_record(user, false));
	let (session, wallet) = controller(MockWallet::new(vec![user], CHAIN_A), reader);

	session.connect().await.unwrap();
	let err = session
		.update_post(CHAIN_B, 3, &PostDraft::new("t", "c"))
		.await
		.unwrap_err();
	assert!(matches!(
		err,
		SessionError::WrongChain {
			post_chain: CHAIN_B,
			active_chain: CHAIN_A,
		}
	));
	assert_eq!(wallet.submission_count(), 0);
}

#[tokio::test]
async fn test_set_banned_requires_owner() {
	let user = addr(0x01);
	let mut reader = MockReader::default();
	reader
		.users
		.insert((CHAIN_A, user), registered_record(user, false));
	reader.owners.insert(CHAIN_A, addr(0x02));
	let (session, wallet) = controller(MockWallet::new(vec![user], CHAIN_A), reader);

	session.connect().await.unwrap();
	let err = session.set_banned(addr(0x03), true).await.unwrap_err();
	assert!(matches!(err, SessionError::NotOwner));
	assert_eq!(wallet.submission_count(), 0);
}

#[tokio::test]
async fn test_register_re_derives_status_after_confirmation() {
	let user = addr(0x01);
	let wallet = MockWallet::new(vec![user], CHAIN_A);
	let mut reader = MockReader::default();
	reader.registration_flag = Some(wallet.registered_flag.clone());
	let (session, _) = controller(wallet, reader);

	session.connect().await.unwrap();
	assert!(!session.status().await.is_registered);

	session.register("fresh").await.unwrap();
	let status = session.status().await;
	assert!(status.is_registered);
	assert_eq!(status.username, "fresh");
}

#[tokio::test]
async fn test_event_loop_applies_wallet_initiated_changes() {
	let user = addr(0x01);
	let mut reader = MockReader::default();
	// Registered on chain B only; a wallet-initiated switch must pick that up.
	reader
		.users
		.insert((CHAIN_B, user), registered_record(user, false));
	let wallet = Arc::new(MockWallet::new(vec![user], CHAIN_A));
	let session = Arc::new(SessionController::new(
		registry(),
		wallet.clone(),
		Arc::new(reader),
	));
	tokio::spawn(session.clone().run_event_loop());
	// Let the loop subscribe before anything is published.
	tokio::time::sleep(std::time::Duration::from_millis(10)).await;

	session.connect().await.unwrap();
	assert!(!session.status().await.is_registered);

	wallet
		.events
		.send(WalletEvent::ChainChanged(CHAIN_B))
		.unwrap();
	tokio::time::sleep(std::time::Duration::from_millis(50)).await;
	assert_eq!(session.session().await.chain_id, Some(CHAIN_B));
	assert!(session.status().await.is_registered);

	wallet
		.events
		.send(WalletEvent::AccountsChanged(Vec::new()))
		.unwrap();
	tokio::time::sleep(std::time::Duration::from_millis(50)).await;
	assert!(!session.session().await.connected);
}

#[tokio::test]
async fn test_writes_require_connection() {
	let (session, _) = controller(MockWallet::new(vec![], CHAIN_A), MockReader::default());
	let err = session.register("alice").await.unwrap_err();
	assert!(matches!(err, SessionError::NotConnected));
}
