//! POSIX file-descriptor protocol emitter, generalizing the file-stream
//! exemplar (spec §4.5) to `read(2)`/`write(2)` over a raw descriptor.

use crate::emit::protocol::Protocol;
use crate::schema::ParsedStruct;

pub struct FdProtocol;

impl Protocol for FdProtocol {
    fn transport_state_record(&self) -> String {
        "#include <unistd.h>\n\n\
typedef struct {\n\
  int fd;\n\
  haris_uint32_t curr;\n\
  unsigned char buffer[256];\n\
} HarisFdStream;\n\n"
            .to_string()
    }

    fn private_functions(&self) -> Vec<String> {
        vec![
            "static HarisStatus read_from_fd_stream(void *_stream,\n\
                                       haris_uint32_t count,\n\
                                       const unsigned char **dest)\n\
{\n\
  HarisFdStream *stream = (HarisFdStream*)_stream;\n\
  haris_uint32_t total = 0;\n\
  HARIS_ASSERT(count + stream->curr <= HARIS_MESSAGE_SIZE_LIMIT, SIZE);\n\
  HARIS_ASSERT(count <= 256, SIZE);\n\
  while (total < count) {\n\
    ssize_t n = read(stream->fd, stream->buffer + total, count - total);\n\
    HARIS_ASSERT(n > 0, INPUT);\n\
    total += (haris_uint32_t)n;\n\
  }\n\
  *dest = stream->buffer;\n\
  stream->curr = count;\n\
  return HARIS_SUCCESS;\n\
}\n\n"
                .to_string(),
            "static HarisStatus write_to_fd_stream(void *_stream,\n\
                                      const unsigned char *src,\n\
                                      haris_uint32_t count)\n\
{\n\
  HarisFdStream *stream = (HarisFdStream*)_stream;\n\
  haris_uint32_t total = 0;\n\
  while (total < count) {\n\
    ssize_t n = write(stream->fd, src + total, count - total);\n\
    HARIS_ASSERT(n > 0, INPUT);\n\
    total += (haris_uint32_t)n;\n\
  }\n\
  stream->curr += count;\n\
  return HARIS_SUCCESS;\n\
}\n\n"
                .to_string(),
            "static HarisStatus _public_to_fd(void *ptr,\n\
                                 const HarisStructureInfo *info,\n\
                                 int fd,\n\
                                 haris_uint32_t *out_sz)\n\
{\n\
  HarisStatus result;\n\
  HarisFdStream fd_stream;\n\
  haris_uint32_t encoded_size = haris_lib_size(ptr, info, 0, &result);\n\
  if (encoded_size == 0) return result;\n\
  HARIS_ASSERT(encoded_size <= HARIS_MESSAGE_SIZE_LIMIT, SIZE);\n\
  fd_stream.fd = fd;\n\
  fd_stream.curr = 0;\n\
  if ((result = _haris_to_stream(ptr, info, &fd_stream,\n\
                                 write_to_fd_stream)) != HARIS_SUCCESS)\n\
    return result;\n\
  if (out_sz) *out_sz = fd_stream.curr;\n\
  return HARIS_SUCCESS;\n\
}\n\n"
                .to_string(),
            "static HarisStatus _public_from_fd(void *ptr,\n\
                                   const HarisStructureInfo *info,\n\
                                   int fd,\n\
                                   haris_uint32_t *out_sz)\n\
{\n\
  HarisStatus result;\n\
  HarisFdStream fd_stream;\n\
  fd_stream.fd = fd;\n\
  fd_stream.curr = 0;\n\
  if ((result = _haris_from_stream(ptr, info, &fd_stream,\n\
                                   read_from_fd_stream, 0)) != HARIS_SUCCESS)\n\
    return result;\n\
  if (out_sz) *out_sz = fd_stream.curr;\n\
  return HARIS_SUCCESS;\n\
}\n\n"
                .to_string(),
        ]
    }

    fn public_functions(&self, prefix: &str, strct: &ParsedStruct) -> Vec<String> {
        let name = &strct.name;
        let idx = strct.schema_index;
        vec![
            format!(
                "HarisStatus {prefix}{name}_to_fd({prefix}{name} *strct, int fd,\n\
                        haris_uint32_t *out_sz)\n\
{{\n\
  return _public_to_fd(strct, &haris_lib_structures[{idx}], fd, out_sz);\n}}\n\n"
            ),
            format!(
                "HarisStatus {prefix}{name}_from_fd({prefix}{name} *strct, int fd,\n\
                          haris_uint32_t *out_sz)\n\
{{\n\
  return _public_from_fd(strct, &haris_lib_structures[{idx}], fd, out_sz);\n}}\n\n"
            ),
        ]
    }
}
