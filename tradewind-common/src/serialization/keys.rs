//! The fixed label set keying serialized message envelopes.

pub const TYPE: &str = "Type";
pub const ID: &str = "Id";
pub const TIMESTAMP: &str = "Timestamp";
pub const CORRELATION_ID: &str = "CorrelationId";
pub const TRADER_ID: &str = "TraderId";
pub const ACCOUNT_ID: &str = "AccountId";
pub const STRATEGY_ID: &str = "StrategyId";
pub const POSITION_ID: &str = "PositionId";
pub const ORDER_ID: &str = "OrderId";
pub const ORDER_ID_BROKER: &str = "OrderIdBroker";
pub const POSITION_ID_BROKER: &str = "PositionIdBroker";
pub const EXECUTION_ID: &str = "ExecutionId";
pub const SYMBOL: &str = "Symbol";
pub const ORDER_SIDE: &str = "OrderSide";
pub const ORDER_TYPE: &str = "OrderType";
pub const QUANTITY: &str = "Quantity";
pub const PRICE: &str = "Price";
pub const TIME_IN_FORCE: &str = "TimeInForce";
pub const EXPIRE_TIME: &str = "ExpireTime";
pub const INIT_ID: &str = "InitId";
pub const ORDER: &str = "Order";
pub const ENTRY: &str = "Entry";
pub const STOP_LOSS: &str = "StopLoss";
pub const TAKE_PROFIT: &str = "TakeProfit";
pub const MODIFIED_QUANTITY: &str = "ModifiedQuantity";
pub const MODIFIED_PRICE: &str = "ModifiedPrice";
pub const CURRENCY: &str = "Currency";
pub const CASH_BALANCE: &str = "CashBalance";
pub const CASH_START_DAY: &str = "CashStartDay";
pub const CASH_ACTIVITY_DAY: &str = "CashActivityDay";
pub const MARGIN_USED_LIQUIDATION: &str = "MarginUsedLiquidation";
pub const MARGIN_USED_MAINTENANCE: &str = "MarginUsedMaintenance";
pub const MARGIN_RATIO: &str = "MarginRatio";
pub const MARGIN_CALL_STATUS: &str = "MarginCallStatus";
pub const SUBMITTED_TIME: &str = "SubmittedTime";
pub const ACCEPTED_TIME: &str = "AcceptedTime";
pub const REJECTED_TIME: &str = "RejectedTime";
pub const REJECTED_REASON: &str = "RejectedReason";
pub const REJECTED_RESPONSE_TO: &str = "RejectedResponseTo";
pub const DENIED_REASON: &str = "DeniedReason";
pub const INVALID_REASON: &str = "InvalidReason";
pub const WORKING_TIME: &str = "WorkingTime";
pub const CANCELLED_TIME: &str = "CancelledTime";
pub const EXPIRED_TIME: &str = "ExpiredTime";
pub const MODIFIED_TIME: &str = "ModifiedTime";
pub const FILLED_QUANTITY: &str = "FilledQuantity";
pub const LEAVES_QUANTITY: &str = "LeavesQuantity";
pub const AVERAGE_PRICE: &str = "AveragePrice";
pub const EXECUTION_TIME: &str = "ExecutionTime";
pub const CLIENT_ID: &str = "ClientId";
pub const SERVER_ID: &str = "ServerId";
pub const SESSION_ID: &str = "SessionId";
pub const AUTHENTICATION: &str = "Authentication";
pub const QUERY: &str = "Query";
pub const DATA: &str = "Data";
pub const DATA_TYPE: &str = "DataType";
pub const DATA_ENCODING: &str = "DataEncoding";
pub const MESSAGE: &str = "Message";
pub const RECEIVED_TYPE: &str = "ReceivedType";
pub const LOG_LEVEL: &str = "LogLevel";
pub const LOG_TEXT: &str = "LogText";
pub const THREAD_ID: &str = "ThreadId";
